//! Algorithm components.
//!
//! - `gae`: Generalized Advantage Estimation
//! - `policy_loss`: PPO surrogate, value and KL losses
//! - `action_policy`: categorical action distribution
//! - `actor_critic`: model trait bridging networks and the training loop

pub mod action_policy;
pub mod actor_critic;
pub mod gae;
pub mod policy_loss;

pub use action_policy::DiscretePolicyOutput;
pub use actor_critic::{ActionEvaluation, Evaluation, PolicyModel};
pub use gae::{compute_gae, compute_gae_batched, normalize_advantages};
pub use policy_loss::{approx_kl, ppo_clip_loss, value_loss};
