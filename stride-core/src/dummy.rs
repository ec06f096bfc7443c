//! Deterministic environment and agent used in tests.
//!
//! [`DummyEnv`] runs episodes of configured lengths and tags every observation with a
//! counter, so that the order of stored transitions can be checked. [`DummyAgent`]
//! threads a per-episode step counter through its policy state and records every batch
//! it is given.
use crate::{
    replay_buffer::{EpisodeBatch, WindowBatch},
    record::Record,
    Act, Agent, Env, Learner, LossInfo, Obs, Policy, PolicyStep, ReplayBufferBase, Step,
};
use anyhow::{anyhow, Result};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Dummy observation.
#[derive(Clone, Debug, PartialEq)]
pub struct DummyObs {
    /// Counter incremented for every observation emitted by the environment.
    pub tag: usize,

    /// Number of steps since the last reset.
    pub t: usize,
}

impl Obs for DummyObs {}

/// Dummy action, holding the value of the policy state when it was computed.
#[derive(Clone, Debug, PartialEq)]
pub struct DummyAct(pub usize);

impl Act for DummyAct {}

/// Configuration of [`DummyEnv`].
#[derive(Clone, Debug)]
pub struct DummyEnvConfig {
    /// Lengths of episodes, used in turn.
    pub episode_lengths: Vec<usize>,

    /// Reward of every step.
    pub reward: f32,

    /// If `true`, episodes end with truncation instead of termination.
    pub truncate: bool,

    /// Index of the step, counted from the construction of the environment, which fails.
    pub fail_at_step: Option<usize>,
}

impl Default for DummyEnvConfig {
    fn default() -> Self {
        Self {
            episode_lengths: vec![3],
            reward: 1.0,
            truncate: false,
            fail_at_step: None,
        }
    }
}

impl DummyEnvConfig {
    /// Sets the lengths of episodes.
    pub fn episode_lengths(mut self, episode_lengths: Vec<usize>) -> Self {
        self.episode_lengths = episode_lengths;
        self
    }

    /// Sets the step which fails.
    pub fn fail_at_step(mut self, fail_at_step: Option<usize>) -> Self {
        self.fail_at_step = fail_at_step;
        self
    }

    /// Ends episodes by truncation.
    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }
}

/// Dummy environment.
pub struct DummyEnv {
    config: DummyEnvConfig,
    tag: usize,
    t: usize,
    episode: usize,
    steps: usize,
    in_episode: bool,
    resets: Arc<AtomicUsize>,
}

impl DummyEnv {
    /// Returns a counter of calls to [`Env::reset()`] and [`Env::reset_with_index()`].
    pub fn reset_counter(&self) -> Arc<AtomicUsize> {
        self.resets.clone()
    }

    /// Returns the number of resets so far.
    pub fn n_resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    fn episode_len(&self) -> usize {
        let lens = &self.config.episode_lengths;
        lens[(self.episode - 1) % lens.len()]
    }

    fn next_obs(&mut self) -> DummyObs {
        let obs = DummyObs {
            tag: self.tag,
            t: self.t,
        };
        self.tag += 1;
        obs
    }
}

impl Env for DummyEnv {
    type Config = DummyEnvConfig;
    type Obs = DummyObs;
    type Act = DummyAct;
    type Info = ();

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        if config.episode_lengths.is_empty() || config.episode_lengths.contains(&0) {
            return Err(anyhow!("episode lengths must be positive"));
        }
        Ok(Self {
            config: config.clone(),
            tag: 0,
            t: 0,
            episode: 0,
            steps: 0,
            in_episode: false,
            resets: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn reset(&mut self) -> Result<DummyObs> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        self.episode += 1;
        self.t = 0;
        self.in_episode = true;
        Ok(self.next_obs())
    }

    fn step(&mut self, _a: &DummyAct) -> Result<(Step<Self>, Record)> {
        if !self.in_episode {
            return Err(anyhow!("step() called on a finished episode"));
        }
        if self.config.fail_at_step == Some(self.steps) {
            return Err(anyhow!("DummyEnv failed at step {}", self.steps));
        }
        self.steps += 1;
        self.t += 1;

        let obs = self.next_obs();
        let reward = self.config.reward;
        let step = if self.t < self.episode_len() {
            Step::transition(obs, reward, ())
        } else {
            self.in_episode = false;
            match self.config.truncate {
                true => Step::truncation(obs, reward, ()),
                false => Step::termination(obs, reward, ()),
            }
        };

        Ok((step, Record::empty()))
    }
}

/// Dummy agent.
///
/// The policy state counts the actions taken in the current episode and the action
/// carries this count.
#[derive(Default)]
pub struct DummyAgent {
    is_train: bool,
    n_updates: usize,

    /// Number of transitions in each batch given to [`Learner::update()`].
    pub batch_lens: Vec<usize>,

    /// Number of calls to [`Policy::action()`] in evaluation mode.
    pub n_eval_actions: usize,

    /// Index of the update, counted from zero, which fails.
    pub fail_at_update: Option<usize>,
}

impl DummyAgent {
    /// Constructs a [`DummyAgent`] in training mode.
    pub fn new() -> Self {
        Self {
            is_train: true,
            ..Default::default()
        }
    }

    /// Returns the number of successful updates.
    pub fn n_updates(&self) -> usize {
        self.n_updates
    }

    fn update_with_len(&mut self, len: usize) -> Result<LossInfo> {
        if self.fail_at_update == Some(self.n_updates) {
            return Err(anyhow!("DummyAgent failed at update {}", self.n_updates));
        }
        self.batch_lens.push(len);
        self.n_updates += 1;
        Ok(LossInfo::new(1.0 / self.n_updates as f32))
    }
}

impl Policy<DummyEnv> for DummyAgent {
    type State = usize;

    fn initial_state(&self) -> usize {
        0
    }

    fn action(&mut self, _obs: &DummyObs, state: usize) -> Result<PolicyStep<DummyAct, usize>> {
        if !self.is_train {
            self.n_eval_actions += 1;
        }
        Ok(PolicyStep::new(DummyAct(state), state + 1))
    }
}

impl Learner<WindowBatch<DummyObs, DummyAct>> for DummyAgent {
    fn update(&mut self, batch: WindowBatch<DummyObs, DummyAct>) -> Result<LossInfo> {
        let len = batch.iter().map(|w| w.len()).sum();
        self.update_with_len(len)
    }
}

impl Learner<EpisodeBatch<DummyObs, DummyAct>> for DummyAgent {
    fn update(&mut self, batch: EpisodeBatch<DummyObs, DummyAct>) -> Result<LossInfo> {
        self.update_with_len(batch.len())
    }
}

impl<R> Agent<DummyEnv, R> for DummyAgent
where
    R: ReplayBufferBase,
    DummyAgent: Learner<R::Batch>,
{
    fn train(&mut self) {
        self.is_train = true;
    }

    fn eval(&mut self) {
        self.is_train = false;
    }

    fn is_train(&self) -> bool {
        self.is_train
    }
}
