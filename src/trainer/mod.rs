//! Training loop: configuration, rollout storage and the PPO driver.

pub mod config;
pub mod driver;
pub mod rollout;

pub use config::{ConfigError, TrainingConfig};
pub use driver::{default_optimizer, CycleStats, Trainer};
pub use rollout::{minibatch_indices, Minibatch, RolloutBuffer};
