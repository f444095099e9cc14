//! Default MLP actor-critic network.
//!
//! Two separate 64-64 tanh trunks, one for the policy and one for the
//! value function, each behind an orthogonally initialized head. This is
//! the stock architecture for low-dimensional observation vectors; tasks
//! with structured observations implement [`PolicyModel`] themselves.

use burn::module::Module;
use burn::tensor::activation::tanh;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::algorithms::{DiscretePolicyOutput, Evaluation, PolicyModel};

use super::factory::LayerFactory;
use super::orthogonal::OrthogonalLinear;

/// Width of both hidden layers.
pub const HIDDEN_SIZE: usize = 64;

/// Separate-trunk MLP actor-critic.
#[derive(Module, Debug)]
pub struct MlpActorCritic<B: Backend> {
    actor_fc1: OrthogonalLinear<B>,
    actor_fc2: OrthogonalLinear<B>,
    actor_head: OrthogonalLinear<B>,
    critic_fc1: OrthogonalLinear<B>,
    critic_fc2: OrthogonalLinear<B>,
    critic_head: OrthogonalLinear<B>,
    #[module(skip)]
    obs_size: usize,
    #[module(skip)]
    n_actions: usize,
}

impl<B: Backend> MlpActorCritic<B> {
    /// Build the network for the given observation and action sizes.
    pub fn new(factory: &LayerFactory<B>, obs_size: usize, n_actions: usize) -> Self {
        Self {
            actor_fc1: factory.hidden(obs_size, HIDDEN_SIZE),
            actor_fc2: factory.hidden(HIDDEN_SIZE, HIDDEN_SIZE),
            actor_head: factory.policy_head(HIDDEN_SIZE, n_actions),
            critic_fc1: factory.hidden(obs_size, HIDDEN_SIZE),
            critic_fc2: factory.hidden(HIDDEN_SIZE, HIDDEN_SIZE),
            critic_head: factory.value_head(HIDDEN_SIZE),
            obs_size,
            n_actions,
        }
    }

    fn actor_logits(&self, observations: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = tanh(self.actor_fc1.forward(observations));
        let x = tanh(self.actor_fc2.forward(x));
        self.actor_head.forward(x)
    }

    fn critic_values(&self, observations: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = tanh(self.critic_fc1.forward(observations));
        let x = tanh(self.critic_fc2.forward(x));
        self.critic_head.forward(x)
    }
}

impl<B: Backend> PolicyModel<B> for MlpActorCritic<B> {
    fn forward(&self, observations: Tensor<B, 2>) -> Evaluation<B> {
        let logits = self.actor_logits(observations.clone());
        let values = self.critic_values(observations);
        Evaluation::new(DiscretePolicyOutput::new(logits), values)
    }

    fn observation_size(&self) -> usize {
        self.obs_size
    }

    fn action_space_size(&self) -> usize {
        self.n_actions
    }
}
