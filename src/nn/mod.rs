//! Neural network building blocks.
//!
//! # Modules
//!
//! - [`orthogonal`]: linear layer with orthogonal initialization
//! - [`factory`]: explicit device-bound layer construction
//! - [`mlp`]: default MLP actor-critic

pub mod factory;
pub mod mlp;
pub mod orthogonal;

pub use factory::{LayerFactory, HIDDEN_GAIN, POLICY_GAIN, VALUE_GAIN};
pub use mlp::{MlpActorCritic, HIDDEN_SIZE};
pub use orthogonal::{orthogonal_weights, OrthogonalLinear, OrthogonalLinearConfig};
