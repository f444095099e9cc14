//! On-policy training driver.
//!
//! [`Trainer`] owns the full PPO cycle: collect a fixed-horizon rollout
//! from the vectorized environment with the current policy, bootstrap and
//! estimate advantages, then optimize the policy on shuffled minibatches
//! for several epochs. Collection runs on the inner backend through
//! `model.valid()`, so no autodiff graph is built outside the update path.

use std::collections::VecDeque;

use burn::grad_clipping::GradientClippingConfig;
use burn::module::AutodiffModule;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::Tensor;

use crate::algorithms::{
    approx_kl, compute_gae_batched, normalize_advantages, ppo_clip_loss, value_loss, PolicyModel,
};
use crate::environment::{Environment, VecEnv};
use crate::trainer::config::{ConfigError, TrainingConfig};
use crate::trainer::rollout::{minibatch_indices, RolloutBuffer};

// ============================================================================
// Cycle stats
// ============================================================================

/// Episodes kept in the rolling reward average.
const REWARD_WINDOW: usize = 100;

/// Snapshot of one training cycle, handed to the run callback.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Cycle number, starting at 1.
    pub cycle: usize,
    /// Total cycles the run will perform.
    pub total_cycles: usize,
    /// Environment steps taken so far across all environments.
    pub env_steps: usize,
    /// Episodes completed so far.
    pub episodes: usize,
    /// Mean per-transition reward over this cycle's rollout.
    pub mean_rollout_reward: f32,
    /// Mean return over the most recent completed episodes.
    pub avg_episode_reward: f32,
    /// Policy loss averaged over this cycle's minibatch updates.
    pub policy_loss: f32,
    /// Value loss averaged over this cycle's minibatch updates.
    pub value_loss: f32,
    /// Mean policy entropy averaged over this cycle's minibatch updates.
    pub entropy: f32,
    /// Approximate KL divergence of the last minibatch update.
    pub approx_kl: f32,
    /// Learning rate used this cycle.
    pub learning_rate: f64,
    /// Updates skipped so far because of non-finite losses or advantages.
    pub skipped_updates: usize,
}

/// Scalar totals accumulated over one cycle's minibatch updates.
#[derive(Default)]
struct UpdateStats {
    policy_loss: f32,
    value_loss: f32,
    entropy: f32,
    approx_kl: f32,
    update_count: usize,
    skipped: usize,
}

// ============================================================================
// Optimizer
// ============================================================================

/// Adam with the configured epsilon and global gradient norm clipping.
pub fn default_optimizer<B, M>(config: &TrainingConfig) -> impl Optimizer<M, B>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    AdamConfig::new()
        .with_epsilon(config.adam_epsilon)
        .with_grad_clipping(Some(GradientClippingConfig::Norm(config.max_grad_norm)))
        .init()
}

/// First element of a single-element tensor, copied to the host.
fn scalar<B: AutodiffBackend>(tensor: &Tensor<B, 1>) -> f32 {
    tensor.clone().into_data().as_slice::<f32>().unwrap()[0]
}

// ============================================================================
// Trainer
// ============================================================================

/// PPO trainer over a vectorized environment.
///
/// # Type Parameters
///
/// - `B`: Autodiff backend used for optimization
/// - `M`: Actor-critic model
/// - `O`: Optimizer
pub struct Trainer<B, M, O>
where
    B: AutodiffBackend,
{
    config: TrainingConfig,
    device: B::Device,
    model: M,
    optimizer: O,
    env: VecEnv,
    buffer: RolloutBuffer,

    /// Observations the next action will be chosen from.
    current_obs: Vec<f32>,
    /// Running return of the in-flight episode per environment.
    episode_returns: Vec<f32>,
    /// Returns of the most recent completed episodes.
    recent_rewards: VecDeque<f32>,
    episodes: usize,
    env_steps: usize,
    skipped_updates: usize,
}

impl<B, M, O> Trainer<B, M, O>
where
    B: AutodiffBackend,
    M: PolicyModel<B> + AutodiffModule<B>,
    M::InnerModule: PolicyModel<B::InnerBackend>,
    O: Optimizer<M, B>,
{
    /// Build a trainer over `num_envs` copies of the template environment.
    ///
    /// Validates the configuration, spins up the vectorized environment
    /// and primes the first observations.
    pub fn new(
        config: TrainingConfig,
        device: B::Device,
        model: M,
        optimizer: O,
        template: Box<dyn Environment>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let num_envs = config.num_envs;
        let mut env = VecEnv::from_template(template, num_envs);
        let current_obs = env.reset();
        let buffer = RolloutBuffer::new(num_envs, config.num_steps, env.observation_size());

        Ok(Self {
            config,
            device,
            model,
            optimizer,
            env,
            buffer,
            current_obs,
            episode_returns: vec![0.0; num_envs],
            recent_rewards: VecDeque::with_capacity(REWARD_WINDOW),
            episodes: 0,
            env_steps: 0,
            skipped_updates: 0,
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Run the configured number of training cycles and return the model.
    ///
    /// The callback receives a [`CycleStats`] snapshot after every cycle.
    pub fn run(mut self, mut callback: impl FnMut(&CycleStats)) -> M {
        let total_cycles = self.config.num_updates();

        for cycle in 1..=total_cycles {
            let learning_rate = self.cycle_learning_rate(cycle, total_cycles);

            self.collect();

            let (mut advantages, returns) = self.estimate_advantages();

            let update = if advantages.iter().all(|a| a.is_finite()) {
                normalize_advantages(&mut advantages);
                self.optimize(learning_rate, &advantages, &returns)
            } else {
                log::warn!("cycle {cycle}: non-finite advantages in rollout, skipping update");
                UpdateStats {
                    skipped: 1,
                    ..UpdateStats::default()
                }
            };
            self.skipped_updates += update.skipped;

            let stats = self.cycle_stats(cycle, total_cycles, learning_rate, &update);
            callback(&stats);

            self.buffer.clear();
        }

        self.model
    }

    /// Learning rate for a cycle, linearly annealed when configured.
    fn cycle_learning_rate(&self, cycle: usize, total_cycles: usize) -> f64 {
        if self.config.anneal_lr {
            let frac = 1.0 - (cycle - 1) as f64 / total_cycles as f64;
            self.config.learning_rate * frac.max(0.0)
        } else {
            self.config.learning_rate
        }
    }

    /// Roll the current policy forward for the configured horizon.
    fn collect(&mut self) {
        let num_envs = self.env.num_envs();
        let obs_size = self.env.observation_size();
        let inference = self.model.valid();

        for _step in 0..self.config.num_steps {
            let obs_tensor =
                Tensor::<B::InnerBackend, 1>::from_floats(&self.current_obs[..], &self.device)
                    .reshape([num_envs, obs_size]);

            let evaluation = inference.forward(obs_tensor);
            let (actions, log_probs) = evaluation.policy.sample();
            let values = evaluation.values_host();

            let result = self.env.step(&actions);

            for (i, &reward) in result.rewards.iter().enumerate() {
                self.episode_returns[i] += reward;
                if result.dones[i] {
                    if self.recent_rewards.len() == REWARD_WINDOW {
                        self.recent_rewards.pop_front();
                    }
                    self.recent_rewards.push_back(self.episode_returns[i]);
                    self.episode_returns[i] = 0.0;
                    self.episodes += 1;
                }
            }

            self.buffer.push_step(
                &self.current_obs,
                &actions,
                &log_probs,
                &values,
                &result.rewards,
                &result.dones,
            );

            self.current_obs = result.observations;
            self.env_steps += num_envs;
        }
    }

    /// Advantages and return targets for the stored rollout.
    ///
    /// Bootstrap values come from a value-only pass on the observations
    /// the rollout stopped at; terminal steps mask them out inside the
    /// recursion, so the pass is unconditional.
    fn estimate_advantages(&self) -> (Vec<f32>, Vec<f32>) {
        let num_envs = self.env.num_envs();
        let obs_size = self.env.observation_size();

        let obs_tensor =
            Tensor::<B::InnerBackend, 1>::from_floats(&self.current_obs[..], &self.device)
                .reshape([num_envs, obs_size]);
        let bootstrap = self.model.valid().value_only(obs_tensor);
        let bootstrap: Vec<f32> = bootstrap.into_data().as_slice::<f32>().unwrap().to_vec();

        compute_gae_batched(
            self.buffer.rewards(),
            self.buffer.values(),
            self.buffer.dones(),
            &bootstrap,
            num_envs,
            self.config.gamma,
            self.config.gae_lambda,
        )
    }

    /// Run the configured epochs of minibatch updates over the rollout.
    fn optimize(&mut self, learning_rate: f64, advantages: &[f32], returns: &[f32]) -> UpdateStats {
        let clip_coef = self.config.clip_coef;
        let vf_coef = self.config.vf_coef;
        let ent_coef = self.config.ent_coef;
        let value_clip = if self.config.clip_vloss {
            Some(clip_coef)
        } else {
            None
        };
        let minibatch_size = self.config.minibatch_size();

        let mut stats = UpdateStats::default();

        'epochs: for _epoch in 0..self.config.update_epochs {
            for indices in minibatch_indices(self.buffer.len(), minibatch_size) {
                let batch = self.buffer.gather(&indices, advantages, returns);

                let observations = batch.observations_tensor::<B>(&self.device);
                let old_log_probs = batch.old_log_probs_tensor::<B>(&self.device);
                let old_values = batch.old_values_tensor::<B>(&self.device);
                let batch_advantages = batch.advantages_tensor::<B>(&self.device);
                let batch_returns = batch.returns_tensor::<B>(&self.device);

                let evaluation = self
                    .model
                    .act_and_evaluate(observations, Some(batch.actions()));

                let kl = approx_kl(evaluation.log_probs.clone(), old_log_probs.clone());
                let kl_value = scalar(&kl);

                let policy_loss = ppo_clip_loss(
                    evaluation.log_probs,
                    old_log_probs,
                    batch_advantages,
                    clip_coef,
                );
                let vf_loss = value_loss(evaluation.values, old_values, batch_returns, value_clip);
                let mean_entropy = evaluation.entropy.mean();

                let policy_value = scalar(&policy_loss);
                let vf_value = scalar(&vf_loss);
                let entropy_value = scalar(&mean_entropy);

                let total_value = policy_value + vf_coef * vf_value - ent_coef * entropy_value;
                if !total_value.is_finite() {
                    log::warn!("non-finite loss in minibatch update, skipping step");
                    stats.skipped += 1;
                    continue;
                }

                let total_loss =
                    policy_loss + vf_loss.mul_scalar(vf_coef) - mean_entropy.mul_scalar(ent_coef);

                let grads = total_loss.backward();
                let grads = GradientsParams::from_grads(grads, &self.model);
                self.model = self.optimizer.step(learning_rate, self.model.clone(), grads);

                stats.policy_loss += policy_value;
                stats.value_loss += vf_value;
                stats.entropy += entropy_value;
                stats.approx_kl = kl_value;
                stats.update_count += 1;

                if let Some(target) = self.config.target_kl {
                    if kl_value > target {
                        log::debug!(
                            "KL early stop: approx_kl={:.4} > target_kl={:.4}",
                            kl_value,
                            target
                        );
                        break 'epochs;
                    }
                }
            }
        }

        stats
    }

    fn cycle_stats(
        &self,
        cycle: usize,
        total_cycles: usize,
        learning_rate: f64,
        update: &UpdateStats,
    ) -> CycleStats {
        let n = update.update_count.max(1) as f32;
        let avg_episode_reward = if self.recent_rewards.is_empty() {
            0.0
        } else {
            self.recent_rewards.iter().sum::<f32>() / self.recent_rewards.len() as f32
        };

        CycleStats {
            cycle,
            total_cycles,
            env_steps: self.env_steps,
            episodes: self.episodes,
            mean_rollout_reward: self.buffer.mean_reward(),
            avg_episode_reward,
            policy_loss: update.policy_loss / n,
            value_loss: update.value_loss / n,
            entropy: update.entropy / n,
            approx_kl: update.approx_kl,
            learning_rate,
            skipped_updates: self.skipped_updates,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
