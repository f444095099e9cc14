//! PPO loss functions.
//!
//! All losses are returned as single-element 1D tensors so they stay on the
//! autodiff graph; callers extract scalars for logging after the fact.
//!
//! # Numerical Stability
//!
//! Importance ratios are computed as exp(log_ratio) with the log ratio
//! clamped to [-20, 20] first. exp(20) ≈ 485 million, far beyond any
//! meaningful ratio, so the clamp only guards against overflow.

use burn::tensor::{backend::AutodiffBackend, backend::Backend, Tensor};

/// Maximum log ratio before exp() to prevent overflow.
const MAX_LOG_RATIO: f32 = 20.0;

/// PPO clipped surrogate loss.
///
/// L^CLIP(θ) = -E[min(r_t(θ) · A_t, clip(r_t(θ), 1-ε, 1+ε) · A_t)]
///
/// where r_t(θ) = π_θ(a_t|s_t) / π_old(a_t|s_t). The minimum keeps the
/// pessimistic bound; once the ratio leaves the clip band on the favorable
/// side, the clipped branch wins and its gradient is zero.
///
/// # Arguments
///
/// * `log_probs` - current policy log probs for the taken actions `[batch]`
/// * `old_log_probs` - log probs recorded at collection time `[batch]`
/// * `advantages` - normalized advantages `[batch]`
/// * `clip_coef` - clipping range ε
///
/// # Returns
///
/// Single-element tensor, negated for minimization.
pub fn ppo_clip_loss<B: AutodiffBackend>(
    log_probs: Tensor<B, 1>,
    old_log_probs: Tensor<B, 1>,
    advantages: Tensor<B, 1>,
    clip_coef: f32,
) -> Tensor<B, 1> {
    let log_ratio = log_probs - old_log_probs;
    let ratio = log_ratio.clamp(-MAX_LOG_RATIO, MAX_LOG_RATIO).exp();
    let clipped_ratio = ratio.clone().clamp(1.0 - clip_coef, 1.0 + clip_coef);

    let surr1 = ratio * advantages.clone();
    let surr2 = clipped_ratio * advantages;

    -surr1.min_pair(surr2).mean()
}

/// Value function loss, optionally clipped against the collection-time
/// predictions.
///
/// With `clip = Some(ε)` the prediction may move at most ε away from its
/// old value before the squared error is evaluated; the per-sample maximum
/// of the clipped and unclipped errors is taken so the update stays
/// conservative. The 0.5 factor applies in both branches.
///
/// # Arguments
///
/// * `values` - current value predictions `[batch]`
/// * `old_values` - predictions recorded at collection time `[batch]`
/// * `returns` - regression targets `[batch]`
/// * `clip` - optional clipping range
pub fn value_loss<B: AutodiffBackend>(
    values: Tensor<B, 1>,
    old_values: Tensor<B, 1>,
    returns: Tensor<B, 1>,
    clip: Option<f32>,
) -> Tensor<B, 1> {
    match clip {
        Some(clip) => {
            let values_clipped =
                old_values.clone() + (values.clone() - old_values).clamp(-clip, clip);

            let unclipped = (values - returns.clone()).powf_scalar(2.0);
            let clipped = (values_clipped - returns).powf_scalar(2.0);

            unclipped.max_pair(clipped).mean().mul_scalar(0.5)
        }
        None => (values - returns).powf_scalar(2.0).mean().mul_scalar(0.5),
    }
}

/// Unbiased KL divergence estimate between the old and current policy.
///
/// KL ≈ E[(r - 1) - log r], always non-negative in expectation. Used as a
/// diagnostic and for optional early stopping of the update epochs.
pub fn approx_kl<B: Backend>(
    log_probs: Tensor<B, 1>,
    old_log_probs: Tensor<B, 1>,
) -> Tensor<B, 1> {
    let log_ratio = log_probs - old_log_probs;
    let ratio = log_ratio.clone().clamp(-MAX_LOG_RATIO, MAX_LOG_RATIO).exp();
    (ratio.sub_scalar(1.0) - log_ratio).mean()
}
