//! # On-policy PPO training over vectorized environments.
//!
//! A single-process PPO (clipped surrogate) implementation with GAE
//! advantage estimation, built on Burn. One trainer drives the whole
//! cycle:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Training cycle                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  VecEnv (N copies)                                           │
//! │      │  observations                                         │
//! │      ▼                                                       │
//! │  model.valid() ──► sample actions, log probs, values         │
//! │      │                                                       │
//! │      ▼                                                       │
//! │  RolloutBuffer (num_steps × N transitions)                   │
//! │      │  bootstrap V(s_T), GAE, normalize                     │
//! │      ▼                                                       │
//! │  minibatch epochs: clipped policy + value loss, Adam step    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Collection runs on the inner backend (no autodiff graph); only the
//! minibatch updates build gradients.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use burn::backend::{Autodiff, NdArray};
//! use onpolicy_rl::{
//!     default_optimizer, LayerFactory, MlpActorCritic, PointNavEnv, Trainer, TrainingConfig,
//! };
//!
//! type B = Autodiff<NdArray<f32>>;
//!
//! let config = TrainingConfig::new()
//!     .with_num_envs(16)
//!     .with_num_steps(256)
//!     .with_total_timesteps(500_000)
//!     .build()?;
//!
//! let device = Default::default();
//! let factory = LayerFactory::<B>::new(device);
//! let model = MlpActorCritic::new(&factory, PointNavEnv::OBS_SIZE, PointNavEnv::N_ACTIONS);
//! let optimizer = default_optimizer(&config);
//!
//! let trainer = Trainer::new(
//!     config,
//!     Default::default(),
//!     model,
//!     optimizer,
//!     Box::new(PointNavEnv::new()),
//! )?;
//! let model = trainer.run(|stats| println!("{:?}", stats));
//! ```

pub mod algorithms;
pub mod environment;
pub mod metrics;
pub mod nn;
pub mod trainer;

// Re-export commonly used types
pub use algorithms::{
    approx_kl, compute_gae, compute_gae_batched, normalize_advantages, ppo_clip_loss, value_loss,
    ActionEvaluation, DiscretePolicyOutput, Evaluation, PolicyModel,
};
pub use environment::{Environment, PointNavEnv, StepOutcome, StepResult, VecEnv};
pub use metrics::{ConsoleLogger, CsvLogger, MetricsLogger};
pub use nn::{LayerFactory, MlpActorCritic, OrthogonalLinear, OrthogonalLinearConfig};
pub use trainer::{default_optimizer, ConfigError, CycleStats, Trainer, TrainingConfig};
