//! Categorical action distribution over discrete actions.
//!
//! Wraps the raw policy logits from a model forward pass and exposes the
//! operations the training loop needs: sampling during collection, log
//! probabilities and entropy with gradient flow during optimization, and
//! greedy selection for evaluation.

use burn::tensor::backend::Backend;
use burn::tensor::{activation::softmax, Int, Tensor};

/// Categorical distribution parameterized by unnormalized logits.
#[derive(Clone)]
pub struct DiscretePolicyOutput<B: Backend> {
    /// Unnormalized log probabilities: `[batch, n_actions]`
    pub logits: Tensor<B, 2>,
}

impl<B: Backend> DiscretePolicyOutput<B> {
    pub fn new(logits: Tensor<B, 2>) -> Self {
        Self { logits }
    }

    /// Probabilities (softmax of logits).
    pub fn probs(&self) -> Tensor<B, 2> {
        softmax(self.logits.clone(), 1)
    }

    /// Number of actions.
    pub fn n_actions(&self) -> usize {
        self.logits.dims()[1]
    }

    /// Batch size.
    pub fn batch_size(&self) -> usize {
        self.logits.dims()[0]
    }

    /// Sample one action per batch row along with its log probability.
    ///
    /// Sampling runs on the host via inverse CDF over the softmax
    /// probabilities. The returned log probs are plain floats; collection
    /// stores them detached, gradients never flow through this path.
    pub fn sample(&self) -> (Vec<usize>, Vec<f32>) {
        let probs_data = self.probs().into_data();
        let probs = probs_data.as_slice::<f32>().unwrap();

        let batch_size = self.batch_size();
        let n_actions = self.n_actions();

        let mut actions = Vec::with_capacity(batch_size);
        let mut log_probs = Vec::with_capacity(batch_size);

        for i in 0..batch_size {
            let rand_val = fastrand::f32();
            let mut cumsum = 0.0;
            let mut selected = n_actions - 1;

            for a in 0..n_actions {
                cumsum += probs[i * n_actions + a];
                // The last action also catches the case where rounding left
                // the cumulative sum just short of 1.
                if rand_val < cumsum || a == n_actions - 1 {
                    selected = a;
                    break;
                }
            }

            actions.push(selected);
            log_probs.push((probs[i * n_actions + selected] + 1e-8).ln());
        }

        (actions, log_probs)
    }

    /// Log probabilities of the given actions, with gradient flow.
    ///
    /// # Arguments
    ///
    /// * `actions` - one action index per batch row
    pub fn log_prob_of(&self, actions: &[usize]) -> Tensor<B, 1> {
        let batch_size = actions.len();
        let device = self.logits.device();

        let indices: Vec<i32> = actions.iter().map(|&a| a as i32).collect();
        let indices: Tensor<B, 1, Int> = Tensor::from_ints(indices.as_slice(), &device);
        let indices: Tensor<B, 2, Int> = indices.reshape([batch_size, 1]);

        let selected = self.probs().gather(1, indices);
        let selected: Tensor<B, 1> = selected.flatten(0, 1);

        (selected + 1e-8).log()
    }

    /// Per-row entropy H = -Σ p·log p, with gradient flow.
    pub fn entropy(&self) -> Tensor<B, 1> {
        let probs = self.probs();
        let log_probs = (probs.clone() + 1e-8).log();
        let neg_entropy: Tensor<B, 2> = (probs * log_probs).sum_dim(1);
        -neg_entropy.flatten(0, 1)
    }

    /// Most probable action per batch row, for deterministic evaluation.
    pub fn greedy(&self) -> Vec<usize> {
        let probs_data = self.probs().into_data();
        let probs = probs_data.as_slice::<f32>().unwrap();

        let batch_size = self.batch_size();
        let n_actions = self.n_actions();

        (0..batch_size)
            .map(|i| {
                let row = &probs[i * n_actions..(i + 1) * n_actions];
                let mut best = 0;
                for (a, &p) in row.iter().enumerate() {
                    if p > row[best] {
                        best = a;
                    }
                }
                best
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_sample_returns_valid_indices() {
        let device = Default::default();
        let logits: Tensor<TestBackend, 2> =
            Tensor::from_floats([[1.0, 2.0, 3.0], [3.0, 2.0, 1.0]], &device);
        let output = DiscretePolicyOutput::new(logits);

        let (actions, log_probs) = output.sample();

        assert_eq!(actions.len(), 2);
        assert_eq!(log_probs.len(), 2);
        for &a in &actions {
            assert!(a < 3);
        }
        for &lp in &log_probs {
            assert!(lp <= 0.0);
            assert!(lp.is_finite());
        }
    }

    #[test]
    fn test_sample_follows_peaked_distribution() {
        let device = Default::default();
        // Action 1 carries essentially all probability mass.
        let logits: Tensor<TestBackend, 2> = Tensor::from_floats([[0.0, 50.0, 0.0]], &device);
        let output = DiscretePolicyOutput::new(logits);

        for _ in 0..20 {
            let (actions, _) = output.sample();
            assert_eq!(actions[0], 1);
        }
    }

    #[test]
    fn test_log_prob_of_known_distribution() {
        let device = Default::default();
        // Equal logits over two actions: p = 0.5 each.
        let logits: Tensor<TestBackend, 2> = Tensor::from_floats([[1.0, 1.0]], &device);
        let output = DiscretePolicyOutput::new(logits);

        let log_probs = output.log_prob_of(&[0]).into_data();
        let log_probs = log_probs.as_slice::<f32>().unwrap();

        assert!((log_probs[0] - 0.5f32.ln()).abs() < 1e-4);
    }

    #[test]
    fn test_entropy_uniform_exceeds_peaked() {
        let device = Default::default();
        let uniform: Tensor<TestBackend, 2> = Tensor::from_floats([[1.0, 1.0, 1.0]], &device);
        let peaked: Tensor<TestBackend, 2> = Tensor::from_floats([[10.0, 0.0, 0.0]], &device);

        let entropy_uniform = DiscretePolicyOutput::new(uniform)
            .entropy()
            .into_data()
            .as_slice::<f32>()
            .unwrap()[0];
        let entropy_peaked = DiscretePolicyOutput::new(peaked)
            .entropy()
            .into_data()
            .as_slice::<f32>()
            .unwrap()[0];

        // Uniform over 3 actions has entropy ln(3).
        assert!((entropy_uniform - 3.0f32.ln()).abs() < 1e-3);
        assert!(entropy_uniform > entropy_peaked);
    }

    #[test]
    fn test_greedy_picks_argmax() {
        let device = Default::default();
        let logits: Tensor<TestBackend, 2> =
            Tensor::from_floats([[0.1, 5.0, 0.2], [7.0, 0.0, 0.0]], &device);
        let output = DiscretePolicyOutput::new(logits);

        assert_eq!(output.greedy(), vec![1, 0]);
    }
}
