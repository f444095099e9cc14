//! PPO training on the point navigation environment.
//!
//! Trains the MLP actor-critic with the default CleanRL-style
//! hyperparameters, reporting progress through the console logger, then
//! evaluates the trained policy greedily over a handful of episodes.
//!
//! ```bash
//! RUST_LOG=info cargo run --release --bin train_pointnav
//! ```

use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::tensor::Tensor;

use onpolicy_rl::{
    default_optimizer, ConfigError, ConsoleLogger, Environment, LayerFactory, MetricsLogger,
    MlpActorCritic, PointNavEnv, PolicyModel, Trainer, TrainingConfig,
};

type Inner = NdArray<f32>;
type B = Autodiff<Inner>;

const EVAL_EPISODES: usize = 20;
const EVAL_MAX_STEPS: usize = 200;

fn main() -> Result<(), ConfigError> {
    env_logger::init();

    let config = TrainingConfig::new().with_anneal_lr(true).build()?;

    println!("=== PPO: point navigation ===");
    println!();
    println!("Configuration:");
    println!(
        "  Rollout: {} steps x {} envs = {} transitions",
        config.num_steps,
        config.num_envs,
        config.batch_size()
    );
    println!(
        "  Updates: {} cycles x {} epochs x {} minibatches of {}",
        config.num_updates(),
        config.update_epochs,
        config.num_minibatches,
        config.minibatch_size()
    );
    println!("  Learning rate: {} (annealed: {})", config.learning_rate, config.anneal_lr);
    println!("  Clipped value loss: {}", config.clip_vloss);
    println!();

    let device = Default::default();
    let factory = LayerFactory::<B>::new(device);
    let model = MlpActorCritic::new(&factory, PointNavEnv::OBS_SIZE, PointNavEnv::N_ACTIONS);
    let optimizer = default_optimizer(&config);

    let mut logger = ConsoleLogger::new(config.report_interval);

    let trainer = Trainer::new(
        config.clone(),
        Default::default(),
        model,
        optimizer,
        Box::new(PointNavEnv::new()),
    )?;

    println!("Starting training...");
    println!();
    let model = trainer.run(|stats| logger.log(stats));
    logger.flush();

    evaluate(&model);
    Ok(())
}

/// Run greedy episodes with the trained policy and report how often the
/// goal is reached.
fn evaluate(model: &MlpActorCritic<B>) {
    let device = Default::default();
    let inference = model.valid();
    let mut env = PointNavEnv::new();

    let mut successes = 0;
    let mut total_steps = 0;

    for _ in 0..EVAL_EPISODES {
        let mut obs = env.reset();

        for step in 1..=EVAL_MAX_STEPS {
            let obs_tensor = Tensor::<Inner, 1>::from_floats(&obs[..], &device)
                .reshape([1, PointNavEnv::OBS_SIZE]);
            let action = inference.act_greedy(obs_tensor)[0];

            let outcome = env.step(action);
            obs = outcome.observation;

            if outcome.done {
                successes += 1;
                total_steps += step;
                break;
            }
            if step == EVAL_MAX_STEPS {
                total_steps += step;
            }
        }
    }

    println!();
    println!("Greedy evaluation over {EVAL_EPISODES} episodes:");
    println!("  Goals reached: {successes}/{EVAL_EPISODES}");
    println!(
        "  Mean steps per episode: {:.1}",
        total_steps as f32 / EVAL_EPISODES as f32
    );
}
