//! Rollout storage and minibatch extraction.
//!
//! Transitions are collected step by step into flat host-side vectors,
//! interleaved per step: index `t * num_envs + e` holds step `t` of
//! environment `e`. Tensors are only materialized per minibatch during
//! optimization, so the buffer itself is backend-agnostic.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use rand::seq::SliceRandom;
use rand::thread_rng;

/// Fixed-capacity storage for one rollout across all environments.
pub struct RolloutBuffer {
    /// Flattened observations `[step * num_envs * obs_size]`.
    observations: Vec<f32>,
    /// Action indices taken.
    actions: Vec<usize>,
    /// Log probabilities recorded at collection time.
    log_probs: Vec<f32>,
    /// Value estimates recorded at collection time.
    values: Vec<f32>,
    /// Rewards received.
    rewards: Vec<f32>,
    /// Terminal flags.
    dones: Vec<bool>,

    num_envs: usize,
    obs_size: usize,
    horizon: usize,
    step_count: usize,
}

impl RolloutBuffer {
    /// Create storage for `horizon` steps of `num_envs` environments.
    pub fn new(num_envs: usize, horizon: usize, obs_size: usize) -> Self {
        let capacity = num_envs * horizon;
        Self {
            observations: Vec::with_capacity(capacity * obs_size),
            actions: Vec::with_capacity(capacity),
            log_probs: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            rewards: Vec::with_capacity(capacity),
            dones: Vec::with_capacity(capacity),
            num_envs,
            obs_size,
            horizon,
            step_count: 0,
        }
    }

    /// Append one step of transitions from all environments.
    ///
    /// `observations` are the inputs the policy acted on, `rewards` and
    /// `dones` describe the transition that followed.
    pub fn push_step(
        &mut self,
        observations: &[f32],
        actions: &[usize],
        log_probs: &[f32],
        values: &[f32],
        rewards: &[f32],
        dones: &[bool],
    ) {
        debug_assert_eq!(observations.len(), self.num_envs * self.obs_size);
        debug_assert_eq!(actions.len(), self.num_envs);
        debug_assert_eq!(log_probs.len(), self.num_envs);
        debug_assert_eq!(values.len(), self.num_envs);
        debug_assert_eq!(rewards.len(), self.num_envs);
        debug_assert_eq!(dones.len(), self.num_envs);

        self.observations.extend_from_slice(observations);
        self.actions.extend_from_slice(actions);
        self.log_probs.extend_from_slice(log_probs);
        self.values.extend_from_slice(values);
        self.rewards.extend_from_slice(rewards);
        self.dones.extend_from_slice(dones);
        self.step_count += 1;
    }

    /// Total transitions stored.
    pub fn len(&self) -> usize {
        self.step_count * self.num_envs
    }

    pub fn is_empty(&self) -> bool {
        self.step_count == 0
    }

    /// Whether the configured horizon has been collected.
    pub fn is_full(&self) -> bool {
        self.step_count >= self.horizon
    }

    pub fn num_envs(&self) -> usize {
        self.num_envs
    }

    pub fn obs_size(&self) -> usize {
        self.obs_size
    }

    /// Flattened observations, `obs_size` values per transition.
    pub fn observations(&self) -> &[f32] {
        &self.observations
    }

    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn dones(&self) -> &[bool] {
        &self.dones
    }

    /// Mean reward per transition over the stored rollout.
    pub fn mean_reward(&self) -> f32 {
        if self.rewards.is_empty() {
            return 0.0;
        }
        self.rewards.iter().sum::<f32>() / self.rewards.len() as f32
    }

    /// Discard the rollout, keeping capacity for the next one.
    pub fn clear(&mut self) {
        self.observations.clear();
        self.actions.clear();
        self.log_probs.clear();
        self.values.clear();
        self.rewards.clear();
        self.dones.clear();
        self.step_count = 0;
    }

    /// Copy the transitions at `indices` into one minibatch, pairing them
    /// with their advantages and returns.
    pub fn gather(&self, indices: &[usize], advantages: &[f32], returns: &[f32]) -> Minibatch {
        debug_assert_eq!(advantages.len(), self.len());
        debug_assert_eq!(returns.len(), self.len());

        let batch_size = indices.len();
        let mut batch = Minibatch {
            observations: Vec::with_capacity(batch_size * self.obs_size),
            actions: Vec::with_capacity(batch_size),
            old_log_probs: Vec::with_capacity(batch_size),
            old_values: Vec::with_capacity(batch_size),
            advantages: Vec::with_capacity(batch_size),
            returns: Vec::with_capacity(batch_size),
            obs_size: self.obs_size,
        };

        for &idx in indices {
            let obs_start = idx * self.obs_size;
            batch
                .observations
                .extend_from_slice(&self.observations[obs_start..obs_start + self.obs_size]);
            batch.actions.push(self.actions[idx]);
            batch.old_log_probs.push(self.log_probs[idx]);
            batch.old_values.push(self.values[idx]);
            batch.advantages.push(advantages[idx]);
            batch.returns.push(returns[idx]);
        }

        batch
    }
}

/// Shuffled index chunks covering `0..total` exactly once.
///
/// Every call draws a fresh permutation, so consecutive epochs see the
/// transitions in different minibatch groupings. When `minibatch_size`
/// does not divide `total`, the final chunk is smaller.
pub fn minibatch_indices(total: usize, minibatch_size: usize) -> Vec<Vec<usize>> {
    let mut indices: Vec<usize> = (0..total).collect();
    indices.shuffle(&mut thread_rng());

    indices
        .chunks(minibatch_size)
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// One shuffled minibatch, still on the host.
pub struct Minibatch {
    /// Flattened observations `[batch * obs_size]`.
    pub observations: Vec<f32>,
    /// Action indices.
    pub actions: Vec<usize>,
    /// Collection-time log probabilities.
    pub old_log_probs: Vec<f32>,
    /// Collection-time value estimates.
    pub old_values: Vec<f32>,
    /// Normalized advantages.
    pub advantages: Vec<f32>,
    /// Value targets.
    pub returns: Vec<f32>,

    obs_size: usize,
}

impl Minibatch {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> &[usize] {
        &self.actions
    }

    /// Observations as a `[batch, obs_size]` tensor.
    pub fn observations_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        Tensor::<B, 1>::from_floats(&self.observations[..], device)
            .reshape([self.len(), self.obs_size])
    }

    /// Collection-time log probs as a `[batch]` tensor.
    pub fn old_log_probs_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 1> {
        Tensor::from_floats(&self.old_log_probs[..], device)
    }

    /// Collection-time values as a `[batch]` tensor.
    pub fn old_values_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 1> {
        Tensor::from_floats(&self.old_values[..], device)
    }

    /// Advantages as a `[batch]` tensor.
    pub fn advantages_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 1> {
        Tensor::from_floats(&self.advantages[..], device)
    }

    /// Returns as a `[batch]` tensor.
    pub fn returns_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 1> {
        Tensor::from_floats(&self.returns[..], device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn filled_buffer(num_envs: usize, horizon: usize) -> RolloutBuffer {
        let mut buffer = RolloutBuffer::new(num_envs, horizon, 2);
        for t in 0..horizon {
            let observations: Vec<f32> = (0..num_envs * 2)
                .map(|k| (t * num_envs * 2 + k) as f32)
                .collect();
            let actions: Vec<usize> = (0..num_envs).map(|e| (t + e) % 3).collect();
            let log_probs: Vec<f32> = (0..num_envs).map(|e| -((t + e) as f32)).collect();
            let values: Vec<f32> = (0..num_envs).map(|e| (t * num_envs + e) as f32).collect();
            let rewards: Vec<f32> = vec![1.0; num_envs];
            let dones: Vec<bool> = vec![false; num_envs];
            buffer.push_step(&observations, &actions, &log_probs, &values, &rewards, &dones);
        }
        buffer
    }

    #[test]
    fn test_push_and_len_accounting() {
        let mut buffer = RolloutBuffer::new(3, 4, 2);
        assert!(buffer.is_empty());
        assert!(!buffer.is_full());

        buffer.push_step(
            &[0.0; 6],
            &[0, 1, 2],
            &[-0.1, -0.2, -0.3],
            &[0.5, 0.6, 0.7],
            &[1.0, 2.0, 3.0],
            &[false, true, false],
        );

        assert_eq!(buffer.len(), 3);
        assert!(!buffer.is_empty());

        for _ in 0..3 {
            buffer.push_step(
                &[0.0; 6],
                &[0, 0, 0],
                &[0.0; 3],
                &[0.0; 3],
                &[0.0; 3],
                &[false; 3],
            );
        }
        assert!(buffer.is_full());
        assert_eq!(buffer.len(), 12);

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn test_mean_reward() {
        let buffer = filled_buffer(2, 3);
        assert!((buffer.mean_reward() - 1.0).abs() < 1e-6);

        let empty = RolloutBuffer::new(2, 3, 2);
        assert_eq!(empty.mean_reward(), 0.0);
    }

    #[test]
    fn test_minibatch_indices_cover_all_once() {
        let batches = minibatch_indices(10, 4);

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 4);
        assert_eq!(batches[1].len(), 4);
        assert_eq!(batches[2].len(), 2);

        let mut seen: Vec<usize> = batches.into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_minibatch_indices_exact_division() {
        let batches = minibatch_indices(8, 4);
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 4));
    }

    #[test]
    fn test_minibatch_indices_small_total() {
        let batches = minibatch_indices(3, 10);
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);
    }

    #[test]
    fn test_gather_picks_matching_rows() {
        let buffer = filled_buffer(2, 3);
        let advantages: Vec<f32> = (0..6).map(|i| i as f32 * 10.0).collect();
        let returns: Vec<f32> = (0..6).map(|i| i as f32 * 100.0).collect();

        let batch = buffer.gather(&[4, 1], &advantages, &returns);

        assert_eq!(batch.len(), 2);
        // Transition 4 is step 2 of env 0, transition 1 is step 0 of env 1.
        assert_eq!(batch.observations, vec![8.0, 9.0, 2.0, 3.0]);
        assert_eq!(batch.old_values, vec![4.0, 1.0]);
        assert_eq!(batch.advantages, vec![40.0, 10.0]);
        assert_eq!(batch.returns, vec![400.0, 100.0]);
    }

    #[test]
    fn test_minibatch_tensor_shapes() {
        let buffer = filled_buffer(2, 3);
        let advantages = vec![0.0; 6];
        let returns = vec![0.0; 6];
        let batch = buffer.gather(&[0, 2, 5], &advantages, &returns);

        let device = Default::default();
        assert_eq!(batch.observations_tensor::<TestBackend>(&device).dims(), [3, 2]);
        assert_eq!(batch.old_log_probs_tensor::<TestBackend>(&device).dims(), [3]);
        assert_eq!(batch.old_values_tensor::<TestBackend>(&device).dims(), [3]);
        assert_eq!(batch.advantages_tensor::<TestBackend>(&device).dims(), [3]);
        assert_eq!(batch.returns_tensor::<TestBackend>(&device).dims(), [3]);
    }
}
