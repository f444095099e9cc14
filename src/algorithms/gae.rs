//! Generalized Advantage Estimation.
//!
//! Advantages are computed by a single backward sweep over the rollout:
//!
//! ```text
//! δ_t = r_t + γ·V(s_{t+1})·(1 - done_t) - V(s_t)
//! A_t = δ_t + γλ·(1 - done_t)·A_{t+1}
//! ```
//!
//! λ interpolates between one-step TD (λ = 0) and Monte Carlo (λ = 1).
//! Both extremes fall out of the same recursion, no special-casing.
//! Returns are `A_t + V(s_t)` and serve as value-function targets.

/// Compute advantages and returns for one trajectory.
///
/// `dones[t]` marks the transition out of step `t` as terminal, which cuts
/// the recursion: neither the bootstrap nor any later step leaks across an
/// episode boundary. `bootstrap_value` is V of the observation that follows
/// the final step and is only consulted when that step is non-terminal.
///
/// # Arguments
///
/// * `rewards` - per-step rewards `[horizon]`
/// * `values` - per-step value estimates `[horizon]`
/// * `dones` - per-step terminal flags `[horizon]`
/// * `bootstrap_value` - value estimate for the state after the last step
/// * `gamma` - discount factor
/// * `lambda` - GAE smoothing parameter
///
/// # Returns
///
/// `(advantages, returns)`, both `[horizon]`
pub fn compute_gae(
    rewards: &[f32],
    values: &[f32],
    dones: &[bool],
    bootstrap_value: f32,
    gamma: f32,
    lambda: f32,
) -> (Vec<f32>, Vec<f32>) {
    let horizon = rewards.len();
    assert_eq!(values.len(), horizon);
    assert_eq!(dones.len(), horizon);

    let mut advantages = vec![0.0f32; horizon];
    let mut returns = vec![0.0f32; horizon];

    let mut gae = 0.0f32;
    for t in (0..horizon).rev() {
        let not_done = if dones[t] { 0.0 } else { 1.0 };
        let next_value = if t == horizon - 1 {
            bootstrap_value
        } else {
            values[t + 1]
        };

        let delta = rewards[t] + gamma * next_value * not_done - values[t];
        gae = delta + gamma * lambda * not_done * gae;

        advantages[t] = gae;
        returns[t] = gae + values[t];
    }

    (advantages, returns)
}

/// Compute advantages and returns for a time-major vectorized rollout.
///
/// Storage is interleaved per step: index `t * num_envs + e` holds step `t`
/// of environment `e`. Each environment runs its own backward recursion with
/// its own bootstrap value; the loop works directly on the interleaved
/// layout, stepping backward by `num_envs` per environment.
///
/// # Arguments
///
/// * `rewards` - rewards `[horizon * num_envs]`
/// * `values` - value estimates `[horizon * num_envs]`
/// * `dones` - terminal flags `[horizon * num_envs]`
/// * `bootstrap_values` - per-environment bootstrap values `[num_envs]`
/// * `num_envs` - number of interleaved environments
/// * `gamma` - discount factor
/// * `lambda` - GAE smoothing parameter
///
/// # Returns
///
/// `(advantages, returns)`, both `[horizon * num_envs]`
pub fn compute_gae_batched(
    rewards: &[f32],
    values: &[f32],
    dones: &[bool],
    bootstrap_values: &[f32],
    num_envs: usize,
    gamma: f32,
    lambda: f32,
) -> (Vec<f32>, Vec<f32>) {
    let total = rewards.len();
    assert_eq!(values.len(), total);
    assert_eq!(dones.len(), total);
    assert_eq!(bootstrap_values.len(), num_envs);
    assert_eq!(total % num_envs, 0, "rollout length must be a multiple of num_envs");

    let horizon = total / num_envs;
    let mut advantages = vec![0.0f32; total];
    let mut returns = vec![0.0f32; total];

    for env in 0..num_envs {
        let mut gae = 0.0f32;
        for t in (0..horizon).rev() {
            let i = t * num_envs + env;
            let not_done = if dones[i] { 0.0 } else { 1.0 };
            let next_value = if t == horizon - 1 {
                bootstrap_values[env]
            } else {
                values[i + num_envs]
            };

            let delta = rewards[i] + gamma * next_value * not_done - values[i];
            gae = delta + gamma * lambda * not_done * gae;

            advantages[i] = gae;
            returns[i] = gae + values[i];
        }
    }

    (advantages, returns)
}

/// Normalize advantages in place to zero mean and unit variance.
///
/// Uses the population variance over the full batch. The epsilon on the
/// standard deviation keeps a constant batch (zero variance) finite: every
/// element maps to 0 instead of NaN. Empty input is a no-op.
pub fn normalize_advantages(advantages: &mut [f32]) {
    if advantages.is_empty() {
        return;
    }

    let n = advantages.len() as f32;
    let mean = advantages.iter().sum::<f32>() / n;
    let variance = advantages.iter().map(|a| (a - mean) * (a - mean)).sum::<f32>() / n;
    let std = variance.sqrt();

    for a in advantages.iter_mut() {
        *a = (*a - mean) / (std + 1e-8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_equal_advantages_plus_values() {
        let rewards = vec![1.0, -0.5, 2.0, 0.0];
        let values = vec![0.3, 0.7, -0.2, 1.1];
        let dones = vec![false, true, false, false];
        let (advantages, returns) = compute_gae(&rewards, &values, &dones, 0.8, 0.99, 0.95);

        for t in 0..rewards.len() {
            assert!(
                (returns[t] - (advantages[t] + values[t])).abs() < 1e-6,
                "returns[{t}] should equal advantages[{t}] + values[{t}]"
            );
        }
    }

    #[test]
    fn test_lambda_zero_is_one_step_td() {
        let rewards = vec![1.0, 1.0];
        let values = vec![2.0, 3.0];
        let dones = vec![false, false];
        let (advantages, _) = compute_gae(&rewards, &values, &dones, 4.0, 0.5, 0.0);

        // Each advantage is exactly its own TD residual.
        assert!((advantages[0] - (1.0 + 0.5 * 3.0 - 2.0)).abs() < 1e-6);
        assert!((advantages[1] - (1.0 + 0.5 * 4.0 - 3.0)).abs() < 1e-6);
    }

    #[test]
    fn test_lambda_one_gamma_one_is_monte_carlo() {
        let rewards = vec![1.0, 2.0, 3.0];
        let values = vec![0.5, 0.5, 0.5];
        let dones = vec![false, false, false];
        let (advantages, _) = compute_gae(&rewards, &values, &dones, 2.0, 1.0, 1.0);

        // Undiscounted suffix sum (plus bootstrap) minus the baseline.
        assert!((advantages[0] - 7.5).abs() < 1e-6);
        assert!((advantages[1] - 6.5).abs() < 1e-6);
        assert!((advantages[2] - 4.5).abs() < 1e-6);
    }

    #[test]
    fn test_known_values() {
        // Constant -1 reward, zero values, default gamma/lambda.
        let rewards = vec![-1.0; 5];
        let values = vec![0.0; 5];
        let dones = vec![false; 5];
        let (advantages, _) = compute_gae(&rewards, &values, &dones, 0.0, 0.99, 0.95);

        let expected = [-4.4393618, -3.65695035, -2.82504025, -1.9405, -1.0];
        for (t, &e) in expected.iter().enumerate() {
            assert!(
                (advantages[t] - e).abs() < 1e-4,
                "advantages[{t}] = {}, expected {e}",
                advantages[t]
            );
        }
    }

    #[test]
    fn test_terminal_cuts_recursion() {
        // Step 0 ends its episode, so nothing from step 1 may reach it.
        let rewards_a = vec![1.0, 100.0];
        let values_a = vec![0.5, 50.0];
        let rewards_b = vec![1.0, -7.0];
        let values_b = vec![0.5, 3.0];
        let dones = vec![true, false];

        let (adv_a, _) = compute_gae(&rewards_a, &values_a, &dones, 999.0, 0.99, 0.95);
        let (adv_b, _) = compute_gae(&rewards_b, &values_b, &dones, -1.0, 0.99, 0.95);

        assert!((adv_a[0] - 0.5).abs() < 1e-6);
        assert_eq!(adv_a[0], adv_b[0]);
    }

    #[test]
    fn test_bootstrap_ignored_when_last_step_terminal() {
        let rewards = vec![2.0];
        let values = vec![0.5];
        let dones = vec![true];
        let (advantages, _) = compute_gae(&rewards, &values, &dones, 1e6, 0.99, 0.95);

        assert!((advantages[0] - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_batched_matches_per_env() {
        // Two environments with different trajectories, interleaved per step.
        let rewards_e0 = vec![1.0, 0.5, -1.0];
        let values_e0 = vec![0.2, 0.4, 0.6];
        let dones_e0 = vec![false, true, false];
        let rewards_e1 = vec![-2.0, 3.0, 0.0];
        let values_e1 = vec![1.0, -0.5, 0.3];
        let dones_e1 = vec![false, false, false];

        let mut rewards = Vec::new();
        let mut values = Vec::new();
        let mut dones = Vec::new();
        for t in 0..3 {
            rewards.extend_from_slice(&[rewards_e0[t], rewards_e1[t]]);
            values.extend_from_slice(&[values_e0[t], values_e1[t]]);
            dones.extend_from_slice(&[dones_e0[t], dones_e1[t]]);
        }

        let (adv, ret) =
            compute_gae_batched(&rewards, &values, &dones, &[0.7, -0.2], 2, 0.99, 0.95);
        let (adv_e0, ret_e0) = compute_gae(&rewards_e0, &values_e0, &dones_e0, 0.7, 0.99, 0.95);
        let (adv_e1, ret_e1) = compute_gae(&rewards_e1, &values_e1, &dones_e1, -0.2, 0.99, 0.95);

        for t in 0..3 {
            assert!((adv[t * 2] - adv_e0[t]).abs() < 1e-6);
            assert!((adv[t * 2 + 1] - adv_e1[t]).abs() < 1e-6);
            assert!((ret[t * 2] - ret_e0[t]).abs() < 1e-6);
            assert!((ret[t * 2 + 1] - ret_e1[t]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_normalize_zero_mean_unit_std() {
        let mut advantages = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        normalize_advantages(&mut advantages);

        let n = advantages.len() as f32;
        let mean: f32 = advantages.iter().sum::<f32>() / n;
        let variance: f32 = advantages.iter().map(|a| (a - mean) * (a - mean)).sum::<f32>() / n;
        assert!(mean.abs() < 1e-6);
        assert!((variance.sqrt() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_normalize_empty_is_noop() {
        let mut advantages: Vec<f32> = vec![];
        normalize_advantages(&mut advantages);
        assert!(advantages.is_empty());
    }

    #[test]
    fn test_normalize_constant_batch_goes_to_zero() {
        let mut advantages = vec![3.0; 4];
        normalize_advantages(&mut advantages);
        for a in &advantages {
            assert_eq!(*a, 0.0);
        }
    }

    #[test]
    fn test_normalize_single_element_goes_to_zero() {
        let mut advantages = vec![5.0];
        normalize_advantages(&mut advantages);
        assert_eq!(advantages[0], 0.0);
    }
}
