use anyhow::Result;
use clap::Parser;
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, Write},
    path::Path,
};
use stride::{
    corridor::{Corridor, CorridorAct, CorridorConfig, CorridorObs},
    tabular::{EpsilonGreedy, QLearningAgent, QLearningConfig},
    CsvRecorder,
};
use stride_core::{
    replay_buffer::{RingReplayBuffer, RingReplayBufferConfig},
    Agent as _, Configurable, DefaultEvaluator, Env as _, Evaluator as _, ReplayBufferBase,
    TrainReport, Trainer, TrainerConfig,
};

const LENGTH: usize = 5;
const MAX_STEPS: usize = 20;
const LEARNING_RATE: f32 = 0.5;
const DISCOUNT_FACTOR: f32 = 0.9;
const EPS_FINAL_STEP: usize = 1000;
const BATCH_SIZE: usize = 16;
const WARMUP_PERIOD: usize = 100;
const NUM_ITERATIONS: usize = 2000;
const LOG_INTERVAL: usize = 100;
const EVAL_INTERVAL: usize = 200;
const N_EPISODES_PER_EVAL: usize = 5;
const REPLAY_BUFFER_CAPACITY: usize = 10000;
const MODEL_DIR: &str = "./stride/examples/model/corridor_q_learning";

type Env = Corridor;
type ReplayBuffer = RingReplayBuffer<CorridorObs, CorridorAct>;
type Agent = QLearningAgent<Env>;

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
struct CorridorQLearningConfig {
    env_config: CorridorConfig,
    agent_config: QLearningConfig,
    trainer_config: TrainerConfig,
    replay_buffer_config: RingReplayBufferConfig,
}

impl CorridorQLearningConfig {
    fn new(num_iterations: usize, slip_prob: f32) -> Self {
        let env_config = CorridorConfig::default()
            .length(LENGTH)
            .max_steps(MAX_STEPS)
            .slip_prob(slip_prob);
        let agent_config = QLearningConfig::default()
            .n_states(LENGTH)
            .learning_rate(LEARNING_RATE)
            .discount_factor(DISCOUNT_FACTOR)
            .explorer(EpsilonGreedy::with_final_step(EPS_FINAL_STEP));
        let trainer_config = TrainerConfig::default()
            .num_iterations(num_iterations)
            .initial_collect_steps(WARMUP_PERIOD)
            .collect_steps_per_iteration(1)
            .batch_size(BATCH_SIZE)
            .log_interval(LOG_INTERVAL)
            .eval_interval(EVAL_INTERVAL)
            .num_eval_episodes(N_EPISODES_PER_EVAL);
        // Q-learning updates take pairs of consecutive transitions
        let replay_buffer_config = RingReplayBufferConfig::default()
            .capacity(REPLAY_BUFFER_CAPACITY)
            .window(2);
        Self {
            env_config,
            agent_config,
            trainer_config,
            replay_buffer_config,
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

/// Train/eval Q-learning agent in the corridor environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML file of the configuration, overriding the defaults
    #[arg(short, long)]
    config: Option<String>,

    /// Directory where the configuration, metrics and Q table are saved
    #[arg(short, long, default_value = MODEL_DIR)]
    model_dir: String,

    /// The number of optimization steps
    #[arg(short, long, default_value_t = NUM_ITERATIONS)]
    num_iterations: usize,

    /// Probability that an action is flipped
    #[arg(short, long, default_value_t = 0.0)]
    slip_prob: f32,
}

fn train(config: &CorridorQLearningConfig, model_dir: &str) -> Result<TrainReport> {
    let model_dir = Path::new(model_dir);
    fs::create_dir_all(model_dir)?;
    config.save(model_dir.join("config.yaml"))?;

    let mut trainer = Trainer::build(config.trainer_config.clone())?;
    let env = Env::build(&config.env_config, 0)?;
    let mut agent = Agent::build(config.agent_config.clone());
    let mut buffer = ReplayBuffer::build(&config.replay_buffer_config)?;
    let mut recorder = CsvRecorder::new(model_dir.join("metrics.csv"))?;
    let mut evaluator = {
        let env = Env::build(&config.env_config, 1)?;
        trainer.default_evaluator(env)?
    };

    let report = trainer.train(env, &mut agent, &mut buffer, &mut recorder, &mut evaluator)?;
    agent.save_params(model_dir.join("q_table.yaml"))?;
    Ok(report)
}

fn eval(config: &CorridorQLearningConfig, model_dir: &str, n_episodes: usize) -> Result<f32> {
    let mut agent = Agent::build(config.agent_config.clone());
    agent.load_params(Path::new(model_dir).join("q_table.yaml"))?;
    <Agent as stride_core::Agent<Env, ReplayBuffer>>::eval(&mut agent);

    let record = {
        let env = Env::build(&config.env_config, 2)?;
        DefaultEvaluator::new(env, n_episodes)?
    }
    .evaluate(&mut agent)?;
    let average_return = record.get_scalar("average_return")?;
    info!("Average return of the saved Q table: {}", average_return);
    Ok(average_return)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => CorridorQLearningConfig::load(path)?,
        None => CorridorQLearningConfig::new(args.num_iterations, args.slip_prob),
    };
    train(&config, &args.model_dir)?;
    eval(&config, &args.model_dir, N_EPISODES_PER_EVAL)?;

    Ok(())
}
