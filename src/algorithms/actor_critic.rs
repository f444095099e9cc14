//! Actor-critic model abstraction.
//!
//! [`PolicyModel`] is the seam between the training loop and a concrete
//! network: anything that maps an observation batch to action logits plus
//! value estimates can be trained. The trait is implemented against any
//! `B: Backend` so the same model type serves both roles:
//!
//! - training on an autodiff backend, where `forward` builds a graph, and
//! - collection on the inner backend via `model.valid()`, where no graph
//!   is accumulated.

use burn::module::Module;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::action_policy::DiscretePolicyOutput;

// ============================================================================
// Forward output
// ============================================================================

/// Raw output of one actor-critic forward pass.
#[derive(Clone)]
pub struct Evaluation<B: Backend> {
    /// Action distribution for the batch.
    pub policy: DiscretePolicyOutput<B>,
    /// Value estimates `[batch, 1]`.
    pub values: Tensor<B, 2>,
}

impl<B: Backend> Evaluation<B> {
    pub fn new(policy: DiscretePolicyOutput<B>, values: Tensor<B, 2>) -> Self {
        Self { policy, values }
    }

    /// Value estimates flattened to `[batch]`.
    pub fn values_flat(&self) -> Tensor<B, 1> {
        self.values.clone().flatten(0, 1)
    }

    /// Value estimates copied to the host.
    pub fn values_host(&self) -> Vec<f32> {
        self.values_flat()
            .into_data()
            .as_slice::<f32>()
            .unwrap()
            .to_vec()
    }
}

/// Per-action evaluation of a batch, as consumed by the PPO update.
///
/// `log_probs`, `entropy` and `values` stay on the tensor graph; gradients
/// flow back into the model that produced them.
pub struct ActionEvaluation<B: Backend> {
    /// One action index per batch row.
    pub actions: Vec<usize>,
    /// Log probability of each action under the current policy `[batch]`.
    pub log_probs: Tensor<B, 1>,
    /// Policy entropy per batch row `[batch]`.
    pub entropy: Tensor<B, 1>,
    /// Value estimates `[batch]`.
    pub values: Tensor<B, 1>,
}

// ============================================================================
// Model trait
// ============================================================================

/// An actor-critic network over a discrete action space.
///
/// Implementors provide the forward pass and their fixed sizes; action
/// selection and evaluation are derived from those.
pub trait PolicyModel<B: Backend>: Module<B> + Clone + Send + 'static {
    /// Forward pass for a `[batch, observation_size]` batch.
    fn forward(&self, observations: Tensor<B, 2>) -> Evaluation<B>;

    /// Observation width the model was built for.
    fn observation_size(&self) -> usize;

    /// Number of discrete actions the model was built for.
    fn action_space_size(&self) -> usize;

    /// Evaluate a batch, either for given actions or for freshly sampled
    /// ones.
    ///
    /// With `Some(actions)` the log probs are computed for those actions
    /// with gradient flow; this is the training path. With `None` actions
    /// are sampled from the current policy and their log probs are
    /// re-imported as constants, so no gradient reaches the sampling.
    fn act_and_evaluate(
        &self,
        observations: Tensor<B, 2>,
        actions: Option<&[usize]>,
    ) -> ActionEvaluation<B> {
        let evaluation = self.forward(observations);
        let entropy = evaluation.policy.entropy();
        let values = evaluation.values_flat();

        match actions {
            Some(actions) => {
                let log_probs = evaluation.policy.log_prob_of(actions);
                ActionEvaluation {
                    actions: actions.to_vec(),
                    log_probs,
                    entropy,
                    values,
                }
            }
            None => {
                let (actions, log_probs) = evaluation.policy.sample();
                let device = evaluation.policy.logits.device();
                let log_probs = Tensor::from_floats(log_probs.as_slice(), &device);
                ActionEvaluation {
                    actions,
                    log_probs,
                    entropy,
                    values,
                }
            }
        }
    }

    /// Value estimates only, `[batch]`.
    fn value_only(&self, observations: Tensor<B, 2>) -> Tensor<B, 1> {
        self.forward(observations).values_flat()
    }

    /// Deterministic argmax actions for evaluation runs.
    fn act_greedy(&self, observations: Tensor<B, 2>) -> Vec<usize> {
        self.forward(observations).policy.greedy()
    }
}

// ============================================================================
// Tests
// ============================================================================
