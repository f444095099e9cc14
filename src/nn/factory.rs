//! Explicit layer construction with per-role gains.
//!
//! [`LayerFactory`] owns the device every layer and tensor is created on
//! and is passed by value to wherever a network is built. All device
//! plumbing goes through it; nothing in the crate reaches for a global.
//!
//! The gain constants follow the standard actor-critic recipe: sqrt(2)
//! for hidden layers under tanh, 1.0 for the value head, and a small gain
//! for the policy head so the initial action distribution is close to
//! uniform.

use burn::tensor::backend::Backend;

use super::orthogonal::{OrthogonalLinear, OrthogonalLinearConfig};

/// Gain for hidden layers.
pub const HIDDEN_GAIN: f32 = std::f32::consts::SQRT_2;
/// Gain for the value head.
pub const VALUE_GAIN: f32 = 1.0;
/// Gain for the policy head.
pub const POLICY_GAIN: f32 = 0.01;

/// Builds orthogonally initialized layers on a fixed device.
#[derive(Debug, Clone)]
pub struct LayerFactory<B: Backend> {
    device: B::Device,
}

impl<B: Backend> LayerFactory<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// The device this factory creates layers on.
    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// A linear layer with an explicit gain.
    pub fn linear(&self, d_input: usize, d_output: usize, gain: f32) -> OrthogonalLinear<B> {
        OrthogonalLinearConfig::new(d_input, d_output)
            .with_gain(gain)
            .init(&self.device)
    }

    /// A hidden layer with the sqrt(2) gain.
    pub fn hidden(&self, d_input: usize, d_output: usize) -> OrthogonalLinear<B> {
        self.linear(d_input, d_output, HIDDEN_GAIN)
    }

    /// A value head mapping features to one scalar estimate.
    pub fn value_head(&self, d_input: usize) -> OrthogonalLinear<B> {
        self.linear(d_input, 1, VALUE_GAIN)
    }

    /// A policy head mapping features to action logits.
    pub fn policy_head(&self, d_input: usize, n_actions: usize) -> OrthogonalLinear<B> {
        self.linear(d_input, n_actions, POLICY_GAIN)
    }
}
