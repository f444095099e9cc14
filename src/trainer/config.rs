//! Training configuration.
//!
//! [`TrainingConfig`] carries every tunable of the training loop. Values
//! are set through builder methods and checked once by [`TrainingConfig::validate`]
//! before training starts; a config that validates cannot fail later for
//! configuration reasons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A count parameter must be positive.
    InvalidCount { field: &'static str, value: usize },
    /// A parameter must be strictly positive.
    NonPositive { field: &'static str, value: f64 },
    /// A parameter must be non-negative.
    Negative { field: &'static str, value: f32 },
    /// A parameter is outside its valid range.
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    /// The rollout is too small for the requested number of minibatches.
    InvalidMinibatch {
        batch_size: usize,
        num_minibatches: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidCount { field, value } => {
                write!(f, "{} must be > 0, got {}", field, value)
            }
            ConfigError::NonPositive { field, value } => {
                write!(f, "{} must be > 0, got {}", field, value)
            }
            ConfigError::Negative { field, value } => {
                write!(f, "{} must be >= 0, got {}", field, value)
            }
            ConfigError::OutOfRange {
                field,
                value,
                min,
                max,
            } => {
                write!(f, "{} must be in [{}, {}], got {}", field, min, max, value)
            }
            ConfigError::InvalidMinibatch {
                batch_size,
                num_minibatches,
            } => {
                write!(
                    f,
                    "batch size ({}) must be >= num_minibatches ({})",
                    batch_size, num_minibatches
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// All tunables of the PPO training loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of parallel environment instances.
    pub num_envs: usize,
    /// Steps collected per environment per cycle (the rollout horizon).
    pub num_steps: usize,
    /// Total environment steps to train for. Training runs
    /// `total_timesteps / batch_size` full cycles; a remainder that does
    /// not fill a cycle is not collected.
    pub total_timesteps: usize,
    /// Optimization epochs over each rollout.
    pub update_epochs: usize,
    /// Number of minibatches the rollout is split into per epoch.
    pub num_minibatches: usize,
    /// Adam learning rate.
    pub learning_rate: f64,
    /// Discount factor.
    pub gamma: f32,
    /// GAE smoothing parameter.
    pub gae_lambda: f32,
    /// PPO surrogate clipping range.
    pub clip_coef: f32,
    /// Value loss coefficient in the total loss.
    pub vf_coef: f32,
    /// Entropy bonus coefficient in the total loss.
    pub ent_coef: f32,
    /// Global gradient norm clip.
    pub max_grad_norm: f32,
    /// Adam epsilon.
    pub adam_epsilon: f32,
    /// Whether to clip the value loss against collection-time predictions.
    pub clip_vloss: bool,
    /// Whether to anneal the learning rate linearly to zero over training.
    pub anneal_lr: bool,
    /// Optional KL threshold; when the approximate KL of a minibatch
    /// exceeds it, the remaining epochs for this rollout are skipped.
    pub target_kl: Option<f32>,
    /// Cycles between progress reports.
    pub report_interval: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_envs: 16,
            num_steps: 256,
            total_timesteps: 500_000,
            update_epochs: 4,
            num_minibatches: 4,
            learning_rate: 2.5e-4,
            gamma: 0.99,
            gae_lambda: 0.95,
            clip_coef: 0.2,
            vf_coef: 0.5,
            ent_coef: 0.01,
            max_grad_norm: 0.5,
            adam_epsilon: 1e-5,
            clip_vloss: true,
            anneal_lr: false,
            target_kl: None,
            report_interval: 10,
        }
    }
}

impl TrainingConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transitions per rollout, across all environments.
    pub fn batch_size(&self) -> usize {
        self.num_steps * self.num_envs
    }

    /// Transitions per minibatch (integer division; epochs cover the
    /// remainder through a smaller tail minibatch).
    pub fn minibatch_size(&self) -> usize {
        self.batch_size() / self.num_minibatches
    }

    /// Number of full collect/optimize cycles.
    pub fn num_updates(&self) -> usize {
        self.total_timesteps / self.batch_size()
    }

    /// Validate all parameters.
    ///
    /// # Validation Rules
    ///
    /// - count parameters must be > 0
    /// - `learning_rate`, `max_grad_norm`, `adam_epsilon` and a set
    ///   `target_kl` must be > 0
    /// - `gamma` and `gae_lambda` must be in [0, 1]
    /// - `clip_coef` must be in (0, 1]
    /// - `vf_coef` and `ent_coef` must be >= 0
    /// - the rollout must hold at least one transition per minibatch
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_envs == 0 {
            return Err(ConfigError::InvalidCount {
                field: "num_envs",
                value: 0,
            });
        }
        if self.num_steps == 0 {
            return Err(ConfigError::InvalidCount {
                field: "num_steps",
                value: 0,
            });
        }
        if self.total_timesteps == 0 {
            return Err(ConfigError::InvalidCount {
                field: "total_timesteps",
                value: 0,
            });
        }
        if self.update_epochs == 0 {
            return Err(ConfigError::InvalidCount {
                field: "update_epochs",
                value: 0,
            });
        }
        if self.num_minibatches == 0 {
            return Err(ConfigError::InvalidCount {
                field: "num_minibatches",
                value: 0,
            });
        }
        if self.report_interval == 0 {
            return Err(ConfigError::InvalidCount {
                field: "report_interval",
                value: 0,
            });
        }

        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "learning_rate",
                value: self.learning_rate,
            });
        }
        if self.max_grad_norm.is_nan() || self.max_grad_norm <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "max_grad_norm",
                value: self.max_grad_norm as f64,
            });
        }
        if self.adam_epsilon.is_nan() || self.adam_epsilon <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "adam_epsilon",
                value: self.adam_epsilon as f64,
            });
        }
        if let Some(target_kl) = self.target_kl {
            if target_kl.is_nan() || target_kl <= 0.0 {
                return Err(ConfigError::NonPositive {
                    field: "target_kl",
                    value: target_kl as f64,
                });
            }
        }

        if self.gamma.is_nan() || self.gamma < 0.0 || self.gamma > 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "gamma",
                value: self.gamma,
                min: 0.0,
                max: 1.0,
            });
        }
        if self.gae_lambda.is_nan() || self.gae_lambda < 0.0 || self.gae_lambda > 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "gae_lambda",
                value: self.gae_lambda,
                min: 0.0,
                max: 1.0,
            });
        }
        if self.clip_coef.is_nan() || self.clip_coef <= 0.0 || self.clip_coef > 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "clip_coef",
                value: self.clip_coef,
                min: 0.0,
                max: 1.0,
            });
        }

        if self.vf_coef.is_nan() || self.vf_coef < 0.0 {
            return Err(ConfigError::Negative {
                field: "vf_coef",
                value: self.vf_coef,
            });
        }
        if self.ent_coef.is_nan() || self.ent_coef < 0.0 {
            return Err(ConfigError::Negative {
                field: "ent_coef",
                value: self.ent_coef,
            });
        }

        if self.batch_size() < self.num_minibatches {
            return Err(ConfigError::InvalidMinibatch {
                batch_size: self.batch_size(),
                num_minibatches: self.num_minibatches,
            });
        }

        Ok(())
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    // Builder methods

    /// Set the number of parallel environments.
    pub fn with_num_envs(mut self, num_envs: usize) -> Self {
        self.num_envs = num_envs;
        self
    }

    /// Set the rollout horizon (steps per environment per cycle).
    pub fn with_num_steps(mut self, num_steps: usize) -> Self {
        self.num_steps = num_steps;
        self
    }

    /// Set the total environment steps to train for.
    pub fn with_total_timesteps(mut self, total_timesteps: usize) -> Self {
        self.total_timesteps = total_timesteps;
        self
    }

    /// Set the optimization epochs per rollout.
    pub fn with_update_epochs(mut self, epochs: usize) -> Self {
        self.update_epochs = epochs;
        self
    }

    /// Set the number of minibatches per epoch.
    pub fn with_num_minibatches(mut self, num_minibatches: usize) -> Self {
        self.num_minibatches = num_minibatches;
        self
    }

    /// Set the learning rate.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the discount factor.
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set the GAE smoothing parameter.
    pub fn with_gae_lambda(mut self, gae_lambda: f32) -> Self {
        self.gae_lambda = gae_lambda;
        self
    }

    /// Set the PPO clipping range.
    pub fn with_clip_coef(mut self, clip_coef: f32) -> Self {
        self.clip_coef = clip_coef;
        self
    }

    /// Set the value loss coefficient.
    pub fn with_vf_coef(mut self, vf_coef: f32) -> Self {
        self.vf_coef = vf_coef;
        self
    }

    /// Set the entropy bonus coefficient.
    pub fn with_ent_coef(mut self, ent_coef: f32) -> Self {
        self.ent_coef = ent_coef;
        self
    }

    /// Set the gradient norm clip.
    pub fn with_max_grad_norm(mut self, max_grad_norm: f32) -> Self {
        self.max_grad_norm = max_grad_norm;
        self
    }

    /// Set the Adam epsilon.
    pub fn with_adam_epsilon(mut self, adam_epsilon: f32) -> Self {
        self.adam_epsilon = adam_epsilon;
        self
    }

    /// Set whether the value loss is clipped.
    pub fn with_clip_vloss(mut self, clip_vloss: bool) -> Self {
        self.clip_vloss = clip_vloss;
        self
    }

    /// Set whether the learning rate anneals linearly to zero.
    pub fn with_anneal_lr(mut self, anneal_lr: bool) -> Self {
        self.anneal_lr = anneal_lr;
        self
    }

    /// Set the KL early-stop threshold. `None` disables early stopping.
    pub fn with_target_kl(mut self, target_kl: Option<f32>) -> Self {
        self.target_kl = target_kl;
        self
    }

    /// Set the report interval in cycles.
    pub fn with_report_interval(mut self, report_interval: usize) -> Self {
        self.report_interval = report_interval;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TrainingConfig::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_derived_sizes() {
        let config = TrainingConfig::new();
        assert_eq!(config.batch_size(), 256 * 16);
        assert_eq!(config.minibatch_size(), 256 * 16 / 4);
        assert_eq!(config.num_updates(), 500_000 / (256 * 16));
    }

    #[test]
    fn test_num_updates_floors_partial_cycles() {
        let config = TrainingConfig::new()
            .with_num_envs(2)
            .with_num_steps(5)
            .with_total_timesteps(25);

        // 25 / 10 = 2 full cycles, the trailing 5 steps are dropped.
        assert_eq!(config.num_updates(), 2);
    }

    #[test]
    fn test_builder_pattern() {
        let config = TrainingConfig::new()
            .with_num_envs(8)
            .with_num_steps(64)
            .with_learning_rate(1e-3)
            .with_target_kl(Some(0.02))
            .with_anneal_lr(true);

        assert_eq!(config.num_envs, 8);
        assert_eq!(config.num_steps, 64);
        assert_eq!(config.learning_rate, 1e-3);
        assert_eq!(config.target_kl, Some(0.02));
        assert!(config.anneal_lr);
    }

    #[test]
    fn test_zero_counts_rejected() {
        assert!(matches!(
            TrainingConfig::new().with_num_envs(0).validate(),
            Err(ConfigError::InvalidCount { field: "num_envs", .. })
        ));
        assert!(matches!(
            TrainingConfig::new().with_num_steps(0).validate(),
            Err(ConfigError::InvalidCount { field: "num_steps", .. })
        ));
        assert!(matches!(
            TrainingConfig::new().with_update_epochs(0).validate(),
            Err(ConfigError::InvalidCount { field: "update_epochs", .. })
        ));
        assert!(matches!(
            TrainingConfig::new().with_num_minibatches(0).validate(),
            Err(ConfigError::InvalidCount { field: "num_minibatches", .. })
        ));
    }

    #[test]
    fn test_nonpositive_rates_rejected() {
        assert!(matches!(
            TrainingConfig::new().with_learning_rate(0.0).validate(),
            Err(ConfigError::NonPositive { field: "learning_rate", .. })
        ));
        assert!(matches!(
            TrainingConfig::new().with_max_grad_norm(-1.0).validate(),
            Err(ConfigError::NonPositive { field: "max_grad_norm", .. })
        ));
        assert!(matches!(
            TrainingConfig::new().with_target_kl(Some(0.0)).validate(),
            Err(ConfigError::NonPositive { field: "target_kl", .. })
        ));
    }

    #[test]
    fn test_gamma_out_of_range_rejected() {
        assert!(matches!(
            TrainingConfig::new().with_gamma(1.5).validate(),
            Err(ConfigError::OutOfRange { field: "gamma", .. })
        ));
        assert!(matches!(
            TrainingConfig::new().with_gamma(-0.1).validate(),
            Err(ConfigError::OutOfRange { field: "gamma", .. })
        ));
        assert!(matches!(
            TrainingConfig::new().with_gamma(f32::NAN).validate(),
            Err(ConfigError::OutOfRange { field: "gamma", .. })
        ));
    }

    #[test]
    fn test_clip_coef_zero_rejected() {
        assert!(matches!(
            TrainingConfig::new().with_clip_coef(0.0).validate(),
            Err(ConfigError::OutOfRange { field: "clip_coef", .. })
        ));
    }

    #[test]
    fn test_negative_coefficients_rejected() {
        assert!(matches!(
            TrainingConfig::new().with_vf_coef(-0.5).validate(),
            Err(ConfigError::Negative { field: "vf_coef", .. })
        ));
        assert!(matches!(
            TrainingConfig::new().with_ent_coef(-0.01).validate(),
            Err(ConfigError::Negative { field: "ent_coef", .. })
        ));
    }

    #[test]
    fn test_zero_coefficients_are_valid() {
        let config = TrainingConfig::new().with_vf_coef(0.0).with_ent_coef(0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_edge_gamma_lambda_are_valid() {
        assert!(TrainingConfig::new()
            .with_gamma(0.0)
            .with_gae_lambda(0.0)
            .validate()
            .is_ok());
        assert!(TrainingConfig::new()
            .with_gamma(1.0)
            .with_gae_lambda(1.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_minibatches_exceeding_batch_rejected() {
        let config = TrainingConfig::new()
            .with_num_envs(1)
            .with_num_steps(2)
            .with_num_minibatches(10);

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidMinibatch {
                batch_size: 2,
                num_minibatches: 10
            })
        ));
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::InvalidCount {
            field: "num_envs",
            value: 0,
        };
        assert_eq!(err.to_string(), "num_envs must be > 0, got 0");

        let err = ConfigError::OutOfRange {
            field: "gamma",
            value: 1.5,
            min: 0.0,
            max: 1.0,
        };
        assert_eq!(err.to_string(), "gamma must be in [0, 1], got 1.5");

        let err = ConfigError::InvalidMinibatch {
            batch_size: 2,
            num_minibatches: 10,
        };
        assert_eq!(
            err.to_string(),
            "batch size (2) must be >= num_minibatches (10)"
        );
    }

    #[test]
    fn test_build_validates() {
        assert!(TrainingConfig::new().build().is_ok());
        assert!(TrainingConfig::new().with_num_envs(0).build().is_err());
    }
}
