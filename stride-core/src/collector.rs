//! Collection of experiences by running a policy in an environment.
use crate::{
    record::{Record, RecordValue},
    Env, ExperienceBufferBase, Policy, PolicyStep, Transition,
};
use anyhow::Result;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Termination rule of [`Collector::run()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectMode {
    /// Runs exactly the given number of environment steps.
    Steps(usize),

    /// Runs until the given number of episodes are completed.
    Episodes(usize),
}

impl CollectMode {
    /// Returns the number of steps or episodes.
    pub fn amount(&self) -> usize {
        match self {
            Self::Steps(n) | Self::Episodes(n) => *n,
        }
    }
}

/// Statistics of a call to [`Collector::run()`].
#[derive(Debug, Default, Clone)]
pub struct CollectStats {
    /// Number of environment steps, equal to the number of pushed transitions.
    pub env_steps: usize,

    /// Number of completed episodes.
    pub episodes: usize,

    /// Total reward of each completed episode.
    pub episode_returns: Vec<f32>,

    /// Length of each completed episode.
    pub episode_lengths: Vec<usize>,

    /// Records returned by the environment, the latest value for each key.
    pub env_record: Record,
}

impl CollectStats {
    /// Returns the mean of the returns of completed episodes, if any.
    pub fn average_return(&self) -> Option<f32> {
        match self.episode_returns.len() {
            0 => None,
            n => Some(self.episode_returns.iter().sum::<f32>() / n as f32),
        }
    }

    /// Converts the statistics into a [`Record`].
    pub fn record(&self) -> Record {
        let mut record = self.env_record.clone();
        record.insert("env_steps", RecordValue::Scalar(self.env_steps as f32));
        record.insert("episodes", RecordValue::Scalar(self.episodes as f32));
        if let Some(r) = self.average_return() {
            record.insert("episode_return", RecordValue::Scalar(r));
            let len = self.episode_lengths.iter().sum::<usize>() as f32 / self.episodes as f32;
            record.insert("episode_length", RecordValue::Scalar(len));
        }
        record
    }
}

/// Reward sum and length of the episode in progress.
#[derive(Debug, Default)]
struct RunningReturn {
    sum: f32,
    len: usize,
}

impl RunningReturn {
    fn add(&mut self, reward: f32) {
        self.sum += reward;
        self.len += 1;
    }

    fn flush(&mut self) -> (f32, usize) {
        let out = (self.sum, self.len);
        *self = Self::default();
        out
    }
}

/// Drives the interaction between an environment and a policy and pushes the
/// resulting transitions into a replay buffer.
///
/// The collector keeps the observation and the policy state of the episode in progress,
/// so that successive calls of [`Collector::run()`] continue the same episode. When an
/// episode ends, the environment is reset before the next action is computed, and the
/// policy state is re-initialized with [`Policy::initial_state()`].
pub struct Collector<E, P>
where
    E: Env,
    P: Policy<E>,
{
    env: E,

    /// Observation the next action is computed from.
    prev_obs: Option<E::Obs>,

    /// Policy state given to the next call of [`Policy::action()`].
    policy_state: Option<P::State>,

    running_return: RunningReturn,
    total_env_steps: usize,
    total_episodes: usize,
}

impl<E, P> Collector<E, P>
where
    E: Env,
    P: Policy<E>,
{
    /// Creates a collector. The environment is reset on the first step.
    pub fn new(env: E) -> Self {
        Self {
            env,
            prev_obs: None,
            policy_state: None,
            running_return: RunningReturn::default(),
            total_env_steps: 0,
            total_episodes: 0,
        }
    }

    /// Returns a reference to the environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Returns the number of environment steps since the construction.
    pub fn total_env_steps(&self) -> usize {
        self.total_env_steps
    }

    /// Returns the number of completed episodes since the construction.
    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    /// Returns `true` if an episode is in progress.
    pub fn in_episode(&self) -> bool {
        self.prev_obs.is_some()
    }

    /// Collects experiences with `policy` and pushes them into `buffer`.
    ///
    /// * [`CollectMode::Steps`]`(n)` runs exactly `n` steps, crossing episode boundaries
    ///   as needed and leaving the last episode in progress for the next call.
    /// * [`CollectMode::Episodes`]`(m)` resets the environment first, abandoning the
    ///   episode in progress if any, and runs until `m` episodes are completed.
    ///
    /// A transition is pushed after every step. Errors of the environment, the policy and
    /// the buffer are returned as they are; transitions pushed before the error stay in
    /// the buffer.
    pub fn run<R>(&mut self, policy: &mut P, buffer: &mut R, mode: CollectMode) -> Result<CollectStats>
    where
        R: ExperienceBufferBase<Item = Transition<E::Obs, E::Act>>,
    {
        let mut stats = CollectStats::default();

        match mode {
            CollectMode::Steps(n) => {
                for _ in 0..n {
                    self.step(policy, buffer, &mut stats)?;
                }
            }
            CollectMode::Episodes(m) => {
                if self.in_episode() {
                    debug!(
                        "Abandons the episode in progress after {} steps",
                        self.running_return.len
                    );
                    self.prev_obs = None;
                    self.policy_state = None;
                }
                while stats.episodes < m {
                    self.step(policy, buffer, &mut stats)?;
                }
            }
        }

        debug!(
            "Collected {} steps, {} episodes",
            stats.env_steps, stats.episodes
        );
        Ok(stats)
    }

    /// Returns the current observation, policy state, and whether the episode has just started.
    fn current(&mut self, policy: &P) -> Result<(E::Obs, P::State, bool)> {
        match (self.prev_obs.take(), self.policy_state.take()) {
            (Some(obs), Some(state)) => Ok((obs, state, false)),
            _ => {
                let obs = self.env.reset()?;
                self.running_return = RunningReturn::default();
                trace!("Reset environment");
                Ok((obs, policy.initial_state(), true))
            }
        }
    }

    fn step<R>(&mut self, policy: &mut P, buffer: &mut R, stats: &mut CollectStats) -> Result<()>
    where
        R: ExperienceBufferBase<Item = Transition<E::Obs, E::Act>>,
    {
        let (obs, state, is_first) = self.current(policy)?;
        let PolicyStep { act, state, .. } = policy.action(&obs, state)?;
        let (step, record) = self.env.step(&act)?;
        let is_last = step.is_done();

        buffer.push(Transition {
            observation: obs,
            action: act,
            reward: step.reward,
            discount: step.discount,
            is_first,
            is_last,
        })?;

        self.running_return.add(step.reward);
        self.total_env_steps += 1;
        stats.env_steps += 1;
        stats.env_record.merge_inplace(record);

        if is_last {
            let (episode_return, episode_len) = self.running_return.flush();
            trace!(
                "Episode finished: return = {}, length = {}",
                episode_return,
                episode_len
            );
            self.total_episodes += 1;
            stats.episodes += 1;
            stats.episode_returns.push(episode_return);
            stats.episode_lengths.push(episode_len);
        } else {
            self.prev_obs = Some(step.obs);
            self.policy_state = Some(state);
        }

        Ok(())
    }
}
