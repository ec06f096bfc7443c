use anyhow::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, Write},
    path::Path,
};
use stride::{
    corridor::{Corridor, CorridorAct, CorridorConfig, CorridorObs},
    tabular::{EpsilonGreedy, MonteCarloAgent, MonteCarloConfig},
    CsvRecorder,
};
use stride_core::{
    replay_buffer::{EpisodicBuffer, EpisodicBufferConfig},
    Configurable, Env as _, ReplayBufferBase, TrainReport, Trainer, TrainerConfig,
};

const LENGTH: usize = 5;
const MAX_STEPS: usize = 20;
const DISCOUNT_FACTOR: f32 = 0.9;
const EPS_FINAL_STEP: usize = 2000;
const EPISODES_PER_ITERATION: usize = 2;
const NUM_ITERATIONS: usize = 300;
const LOG_INTERVAL: usize = 20;
const EVAL_INTERVAL: usize = 50;
const N_EPISODES_PER_EVAL: usize = 5;
const MODEL_DIR: &str = "./stride/examples/model/corridor_monte_carlo";

type Env = Corridor;
type ReplayBuffer = EpisodicBuffer<CorridorObs, CorridorAct>;
type Agent = MonteCarloAgent<Env>;

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
struct CorridorMonteCarloConfig {
    env_config: CorridorConfig,
    agent_config: MonteCarloConfig,
    trainer_config: TrainerConfig,
}

impl CorridorMonteCarloConfig {
    fn new(num_iterations: usize, slip_prob: f32) -> Self {
        let env_config = CorridorConfig::default()
            .length(LENGTH)
            .max_steps(MAX_STEPS)
            .slip_prob(slip_prob);
        let agent_config = MonteCarloConfig::default()
            .n_states(LENGTH)
            .discount_factor(DISCOUNT_FACTOR)
            .explorer(EpsilonGreedy::with_final_step(EPS_FINAL_STEP));
        // On-policy: no warm-up, every update consumes whole episodes
        let trainer_config = TrainerConfig::default()
            .num_iterations(num_iterations)
            .initial_collect_steps(0)
            .collect_episodes_per_iteration(EPISODES_PER_ITERATION)
            .log_interval(LOG_INTERVAL)
            .eval_interval(EVAL_INTERVAL)
            .num_eval_episodes(N_EPISODES_PER_EVAL);
        Self {
            env_config,
            agent_config,
            trainer_config,
        }
    }

    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let rdr = BufReader::new(File::open(path)?);
        Ok(serde_yaml::from_reader(rdr)?)
    }

    fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Train Monte Carlo agent in the corridor environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML file of the configuration, overriding the defaults
    #[arg(short, long)]
    config: Option<String>,

    /// Directory where the configuration and metrics are saved
    #[arg(short, long, default_value = MODEL_DIR)]
    model_dir: String,

    /// The number of optimization steps
    #[arg(short, long, default_value_t = NUM_ITERATIONS)]
    num_iterations: usize,

    /// Probability that an action is flipped
    #[arg(short, long, default_value_t = 0.0)]
    slip_prob: f32,
}

fn train(config: &CorridorMonteCarloConfig, model_dir: &str) -> Result<TrainReport> {
    let model_dir = Path::new(model_dir);
    fs::create_dir_all(model_dir)?;
    config.save(model_dir.join("config.yaml"))?;

    let mut trainer = Trainer::build(config.trainer_config.clone())?;
    let env = Env::build(&config.env_config, 0)?;
    let mut agent = Agent::build(config.agent_config.clone());
    let mut buffer = ReplayBuffer::build(&EpisodicBufferConfig::default())?;
    let mut recorder = CsvRecorder::new(model_dir.join("metrics.csv"))?;
    let mut evaluator = {
        let env = Env::build(&config.env_config, 1)?;
        trainer.default_evaluator(env)?
    };

    trainer.train(env, &mut agent, &mut buffer, &mut recorder, &mut evaluator)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => CorridorMonteCarloConfig::load(path)?,
        None => CorridorMonteCarloConfig::new(args.num_iterations, args.slip_prob),
    };
    let report = train(&config, &args.model_dir)?;
    if let Some((step, average_return)) = report.average_returns.last() {
        println!("Average return at step {}: {}", step, average_return);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{train, CorridorMonteCarloConfig};
    use anyhow::Result;
    use tempdir::TempDir;

    #[test]
    fn test_corridor_monte_carlo() -> Result<()> {
        let tmp_dir = TempDir::new("corridor_monte_carlo")?;
        let model_dir = match tmp_dir.as_ref().to_str() {
            Some(s) => s,
            None => panic!("Failed to get string of temporary directory"),
        };
        let config = CorridorMonteCarloConfig::new(100, 0.1);
        let report = train(&config, model_dir)?;
        assert_eq!(report.train_steps, 100);
        assert_eq!(report.average_returns.len(), 2);
        assert!(tmp_dir.path().join("metrics.csv").exists());
        Ok(())
    }
}
