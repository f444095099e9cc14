//! Environment contracts and the vectorized auto-reset wrapper.
//!
//! A single [`Environment`] owns one episode at a time. [`VecEnv`] composes N
//! independent instances into one batched stepper: every instance consumes
//! only its own action, and an instance that finishes its episode is reset
//! immediately so the batch always carries a live observation for every slot.
//!
//! The physics of a concrete environment are opaque to the training loop.
//! [`PointNavEnv`] is the built-in demo task: steer a point agent to a goal
//! on a fixed-size plane.

// ============================================================================
// Single-instance contract
// ============================================================================

/// Result of stepping a single environment instance.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Observation after the transition.
    pub observation: Vec<f32>,
    /// Reward for the transition.
    pub reward: f32,
    /// Whether the episode ended with this transition.
    pub done: bool,
}

/// One independently-owned episodic environment.
///
/// Implementations must keep `observation_size` and `action_space_size`
/// constant for their whole lifetime, and must treat an out-of-range action
/// index as a programming error (panic), never clamp it silently.
pub trait Environment: Send {
    /// Start a fresh episode and return its first observation.
    fn reset(&mut self) -> Vec<f32>;

    /// Advance one step with a discrete action index.
    fn step(&mut self, action: usize) -> StepOutcome;

    /// Width of the observation vector.
    fn observation_size(&self) -> usize;

    /// Number of discrete actions.
    fn action_space_size(&self) -> usize;

    /// Deep copy into a new, fully independent instance.
    ///
    /// The copy must not share mutable state with `self`; stepping one must
    /// never affect the other.
    fn duplicate(&self) -> Box<dyn Environment>;
}

// ============================================================================
// Vectorized wrapper
// ============================================================================

/// Batched result of stepping every instance of a [`VecEnv`].
///
/// `observations` is the flattened `[num_envs * obs_size]` batch. For an
/// instance whose episode just ended, the slot holds the observation of its
/// freshly reset episode while `rewards`/`dones` still describe the step
/// that ended the old one.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub observations: Vec<f32>,
    pub rewards: Vec<f32>,
    pub dones: Vec<bool>,
}

/// N independent environment instances behind one batched `reset`/`step`.
///
/// The pool must be homogeneous: `observation_size`/`action_space_size`
/// delegate to instance 0 and are assumed to hold for all instances.
pub struct VecEnv {
    envs: Vec<Box<dyn Environment>>,
    obs_size: usize,
    n_actions: usize,
}

impl VecEnv {
    /// Wrap a set of pre-built instances.
    pub fn new(envs: Vec<Box<dyn Environment>>) -> Self {
        assert!(!envs.is_empty(), "VecEnv requires at least one environment");
        let obs_size = envs[0].observation_size();
        let n_actions = envs[0].action_space_size();
        Self {
            envs,
            obs_size,
            n_actions,
        }
    }

    /// Build a pool of `num_envs` instances by deep-copying one template.
    ///
    /// The template itself becomes the last instance, so exactly `num_envs`
    /// independent environments end up in the pool.
    pub fn from_template(template: Box<dyn Environment>, num_envs: usize) -> Self {
        assert!(num_envs > 0, "VecEnv requires at least one environment");
        let mut envs: Vec<Box<dyn Environment>> =
            (0..num_envs - 1).map(|_| template.duplicate()).collect();
        envs.push(template);
        Self::new(envs)
    }

    /// Number of instances in the pool.
    pub fn num_envs(&self) -> usize {
        self.envs.len()
    }

    /// Observation width of instance 0.
    pub fn observation_size(&self) -> usize {
        self.obs_size
    }

    /// Action count of instance 0.
    pub fn action_space_size(&self) -> usize {
        self.n_actions
    }

    /// Reset every instance and return the stacked first observations.
    pub fn reset(&mut self) -> Vec<f32> {
        let mut observations = Vec::with_capacity(self.envs.len() * self.obs_size);
        for env in &mut self.envs {
            observations.extend_from_slice(&env.reset());
        }
        observations
    }

    /// Step every instance with its own action, auto-resetting finished
    /// episodes.
    ///
    /// Terminal rewards and done flags are reported faithfully for the step
    /// that ended the episode; only the returned observation is replaced by
    /// the fresh episode's first observation.
    pub fn step(&mut self, actions: &[usize]) -> StepResult {
        assert_eq!(
            actions.len(),
            self.envs.len(),
            "expected one action per environment"
        );

        let n = self.envs.len();
        let mut observations = Vec::with_capacity(n * self.obs_size);
        let mut rewards = Vec::with_capacity(n);
        let mut dones = Vec::with_capacity(n);

        for (env, &action) in self.envs.iter_mut().zip(actions) {
            let outcome = env.step(action);
            rewards.push(outcome.reward);
            dones.push(outcome.done);
            if outcome.done {
                observations.extend_from_slice(&env.reset());
            } else {
                observations.extend_from_slice(&outcome.observation);
            }
        }

        StepResult {
            observations,
            rewards,
            dones,
        }
    }
}

// ============================================================================
// Built-in demo environment
// ============================================================================

/// Point-navigation task on a fixed plane.
///
/// The agent picks one of four velocity impulses per step (right, left,
/// down, up) and is rewarded for the distance it closes toward a randomly
/// placed goal, with a flat bonus on arrival. The episode ends when the
/// agent is within [`PointNavEnv::GOAL_RADIUS`] of the goal.
///
/// Observation layout: `[vel_x, vel_y, goal_dir_x, goal_dir_y, norm_dist]`
/// where `goal_dir` is the unit vector toward the goal and `norm_dist` is
/// the distance scaled by the plane diagonal.
#[derive(Debug, Clone)]
pub struct PointNavEnv {
    position: [f32; 2],
    velocity: [f32; 2],
    goal: [f32; 2],
    last_distance: f32,
}

impl PointNavEnv {
    /// Plane width.
    pub const WORLD_WIDTH: f32 = 1920.0;
    /// Plane height.
    pub const WORLD_HEIGHT: f32 = 1080.0;
    /// Episode ends when the agent is closer to the goal than this.
    pub const GOAL_RADIUS: f32 = 10.0;
    /// Magnitude of each velocity impulse.
    pub const SPEED: f32 = 30.0;
    /// Flat reward added on reaching the goal.
    pub const GOAL_BONUS: f32 = 10.0;
    /// Observation width.
    pub const OBS_SIZE: usize = 5;
    /// Number of discrete actions.
    pub const N_ACTIONS: usize = 4;

    pub fn new() -> Self {
        Self {
            position: [0.0, 0.0],
            velocity: [0.0, 0.0],
            goal: [0.0, 0.0],
            last_distance: 0.0,
        }
    }

    /// Move the goal. Mainly for scripted evaluation runs.
    pub fn set_goal(&mut self, x: f32, y: f32) {
        self.goal = [x, y];
        self.last_distance = self.distance_to_goal();
    }

    fn distance_to_goal(&self) -> f32 {
        let dx = self.goal[0] - self.position[0];
        let dy = self.goal[1] - self.position[1];
        (dx * dx + dy * dy).sqrt()
    }

    fn observation(&self) -> Vec<f32> {
        let mut dir = [
            self.goal[0] - self.position[0],
            self.goal[1] - self.position[1],
        ];
        let mut dist = (dir[0] * dir[0] + dir[1] * dir[1]).sqrt();
        if dist > 1e-6 {
            dir[0] /= dist;
            dir[1] /= dist;
        } else {
            // Sitting on the goal, direction is undefined.
            dir = [0.0, 0.0];
            dist = 0.0;
        }

        let max_dist =
            (Self::WORLD_WIDTH * Self::WORLD_WIDTH + Self::WORLD_HEIGHT * Self::WORLD_HEIGHT)
                .sqrt();

        vec![
            self.velocity[0],
            self.velocity[1],
            dir[0],
            dir[1],
            dist / max_dist,
        ]
    }

    #[cfg(test)]
    fn place(&mut self, position: [f32; 2], goal: [f32; 2]) {
        self.position = position;
        self.goal = goal;
        self.velocity = [0.0, 0.0];
        self.last_distance = self.distance_to_goal();
    }
}

impl Default for PointNavEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for PointNavEnv {
    fn reset(&mut self) -> Vec<f32> {
        self.position = [
            fastrand::f32() * Self::WORLD_WIDTH,
            fastrand::f32() * Self::WORLD_HEIGHT,
        ];
        self.velocity = [
            fastrand::f32() * 2.0 * Self::SPEED - Self::SPEED,
            fastrand::f32() * 2.0 * Self::SPEED - Self::SPEED,
        ];
        self.goal = [
            fastrand::f32() * Self::WORLD_WIDTH,
            fastrand::f32() * Self::WORLD_HEIGHT,
        ];
        self.last_distance = self.distance_to_goal();
        self.observation()
    }

    fn step(&mut self, action: usize) -> StepOutcome {
        self.velocity = match action {
            0 => [Self::SPEED, 0.0],
            1 => [-Self::SPEED, 0.0],
            2 => [0.0, Self::SPEED],
            3 => [0.0, -Self::SPEED],
            _ => panic!("unexpected action index {action} for PointNavEnv"),
        };
        self.position[0] += self.velocity[0];
        self.position[1] += self.velocity[1];

        let new_dist = self.distance_to_goal();
        // Positive when the step moved the agent closer.
        let mut reward = self.last_distance - new_dist;
        let done = new_dist < Self::GOAL_RADIUS;
        if done {
            reward += Self::GOAL_BONUS;
        }
        self.last_distance = new_dist;

        StepOutcome {
            observation: self.observation(),
            reward,
            done,
        }
    }

    fn observation_size(&self) -> usize {
        Self::OBS_SIZE
    }

    fn action_space_size(&self) -> usize {
        Self::N_ACTIONS
    }

    fn duplicate(&self) -> Box<dyn Environment> {
        Box::new(self.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
