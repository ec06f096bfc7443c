//! Configuration of [`Trainer`](super::Trainer).
use crate::{error::StrideError, CollectMode};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of optimization steps.
    pub num_iterations: usize,

    /// The number of environment steps collected before the first optimization step.
    pub initial_collect_steps: usize,

    /// Experiences collected in each iteration.
    pub collect: CollectMode,

    /// The number of samples in a batch. Ignored by on-policy buffers.
    pub batch_size: usize,

    /// Interval of reporting the loss in optimization steps.
    pub log_interval: usize,

    /// Interval of evaluation in optimization steps.
    pub eval_interval: usize,

    /// The number of episodes in an evaluation.
    ///
    /// Applied through [`Trainer::default_evaluator`](crate::Trainer::default_evaluator).
    /// An evaluator built otherwise and passed to [`Trainer::train`](crate::Trainer::train)
    /// runs its own number of episodes.
    pub num_eval_episodes: usize,

    /// Interval of flushing records in optimization steps.
    ///
    /// If `None`, records are flushed every `log_interval` steps.
    pub flush_record_interval: Option<usize>,

    /// If `true`, the agent is evaluated once before the first optimization step.
    pub eval_before_training: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            num_iterations: 1000,
            initial_collect_steps: 0,
            collect: CollectMode::Steps(1),
            batch_size: 64,
            log_interval: 100,
            eval_interval: 1000,
            num_eval_episodes: 10,
            flush_record_interval: None,
            eval_before_training: false,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of optimization steps.
    pub fn num_iterations(mut self, v: usize) -> Self {
        self.num_iterations = v;
        self
    }

    /// Sets the number of environment steps collected before training.
    pub fn initial_collect_steps(mut self, v: usize) -> Self {
        self.initial_collect_steps = v;
        self
    }

    /// Collects the given number of environment steps in each iteration.
    pub fn collect_steps_per_iteration(mut self, v: usize) -> Self {
        self.collect = CollectMode::Steps(v);
        self
    }

    /// Collects the given number of episodes in each iteration.
    pub fn collect_episodes_per_iteration(mut self, v: usize) -> Self {
        self.collect = CollectMode::Episodes(v);
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the interval of reporting the loss in optimization steps.
    pub fn log_interval(mut self, v: usize) -> Self {
        self.log_interval = v;
        self
    }

    /// Sets the interval of evaluation in optimization steps.
    pub fn eval_interval(mut self, v: usize) -> Self {
        self.eval_interval = v;
        self
    }

    /// Sets the number of episodes in an evaluation.
    pub fn num_eval_episodes(mut self, v: usize) -> Self {
        self.num_eval_episodes = v;
        self
    }

    /// Sets the interval of flushing records in optimization steps.
    pub fn flush_record_interval(mut self, v: usize) -> Self {
        self.flush_record_interval = Some(v);
        self
    }

    /// Evaluates the agent before training.
    pub fn eval_before_training(mut self, v: bool) -> Self {
        self.eval_before_training = v;
        self
    }

    /// Returns the interval of flushing records in optimization steps.
    pub fn flush_interval(&self) -> usize {
        self.flush_record_interval.unwrap_or(self.log_interval)
    }

    /// Checks that counts and intervals are positive.
    pub fn validate(&self) -> Result<(), StrideError> {
        let positive = [
            ("num_iterations", self.num_iterations),
            ("batch_size", self.batch_size),
            ("log_interval", self.log_interval),
            ("eval_interval", self.eval_interval),
            ("num_eval_episodes", self.num_eval_episodes),
            ("collect", self.collect.amount()),
            ("flush_record_interval", self.flush_interval()),
        ];
        match positive.iter().find(|(_, v)| *v == 0) {
            Some((name, _)) => Err(StrideError::InvalidArgument(format!(
                "{} must be positive",
                name
            ))),
            None => Ok(()),
        }
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
