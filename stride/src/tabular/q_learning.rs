//! Q-learning agent.
use super::{DiscreteAct, DiscreteObs, EpsilonGreedy, QTable};
use anyhow::Result;
use log::trace;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    marker::PhantomData,
    path::Path,
};
use stride_core::{
    error::StrideError,
    record::RecordValue,
    replay_buffer::{RingReplayBuffer, WindowBatch},
    Agent, Configurable, Env, Learner, LossInfo, Policy, PolicyStep,
};

/// Configuration of [`QLearningAgent`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct QLearningConfig {
    /// The number of states.
    pub n_states: usize,

    /// Step size of TD updates.
    pub learning_rate: f32,

    /// Discount factor.
    pub discount_factor: f32,

    /// Exploration in training mode.
    pub explorer: EpsilonGreedy,

    /// Random seed of exploration and tie breaking.
    pub seed: u64,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            n_states: 5,
            learning_rate: 0.1,
            discount_factor: 0.99,
            explorer: EpsilonGreedy::default(),
            seed: 42,
        }
    }
}

impl QLearningConfig {
    /// Sets the number of states.
    pub fn n_states(mut self, v: usize) -> Self {
        self.n_states = v;
        self
    }

    /// Sets the learning rate.
    pub fn learning_rate(mut self, v: f32) -> Self {
        self.learning_rate = v;
        self
    }

    /// Sets the discount factor.
    pub fn discount_factor(mut self, v: f32) -> Self {
        self.discount_factor = v;
        self
    }

    /// Sets the explorer.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`QLearningConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`QLearningConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Tabular Q-learning agent.
///
/// Batches are windows of two consecutive transitions `(w0, w1)` sampled from a
/// [`RingReplayBuffer`]. The TD target of `w0` is
///
/// * `r` if `w0` terminates an episode,
/// * `r + gamma * discount * max_a Q(w1.observation, a)` if the episode goes on.
///
/// Windows starting with a truncated transition are skipped, since the next
/// observation of the truncated episode is not stored.
pub struct QLearningAgent<E> {
    q: QTable,
    learning_rate: f32,
    discount_factor: f32,
    explorer: EpsilonGreedy,
    rng: StdRng,
    is_train: bool,
    phantom: PhantomData<E>,
}

impl<E> QLearningAgent<E> {
    /// Returns the action values.
    pub fn q_table(&self) -> &QTable {
        &self.q
    }

    /// Saves the action values.
    pub fn save_params(&self, path: impl AsRef<Path>) -> Result<()> {
        self.q.save(path)
    }

    /// Loads the action values.
    pub fn load_params(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let q = QTable::load(path)?;
        if (q.n_states(), q.n_actions()) != (self.q.n_states(), self.q.n_actions()) {
            return Err(StrideError::InvalidArgument("Q table shape mismatch".into()).into());
        }
        self.q = q;
        Ok(())
    }
}

impl<E> Configurable for QLearningAgent<E>
where
    E: Env,
    E::Act: DiscreteAct,
{
    type Config = QLearningConfig;

    fn build(config: Self::Config) -> Self {
        Self {
            q: QTable::new(config.n_states, E::Act::N),
            learning_rate: config.learning_rate,
            discount_factor: config.discount_factor,
            explorer: config.explorer,
            rng: StdRng::seed_from_u64(config.seed),
            is_train: true,
            phantom: PhantomData,
        }
    }
}

impl<E> Policy<E> for QLearningAgent<E>
where
    E: Env,
    E::Obs: DiscreteObs,
    E::Act: DiscreteAct,
{
    type State = ();

    fn initial_state(&self) {}

    fn action(&mut self, obs: &E::Obs, _state: ()) -> Result<PolicyStep<E::Act, ()>> {
        let a = self
            .q
            .select(obs.index(), &mut self.explorer, self.is_train, &mut self.rng)?;
        Ok(PolicyStep::new(E::Act::from_index(a), ()))
    }
}

impl<E> Learner<WindowBatch<E::Obs, E::Act>> for QLearningAgent<E>
where
    E: Env,
    E::Obs: DiscreteObs,
    E::Act: DiscreteAct,
{
    fn update(&mut self, batch: WindowBatch<E::Obs, E::Act>) -> Result<LossInfo> {
        if batch.window() != 2 {
            return Err(StrideError::InvalidArgument(format!(
                "Q-learning takes windows of 2 transitions, got {}",
                batch.window()
            ))
            .into());
        }

        let mut sq_err = 0f32;
        let mut n = 0;
        for w in batch.iter() {
            let (tr, next) = (&w[0], &w[1]);
            // An episode cut off by a reset has no next observation.
            if !tr.is_last && next.is_first {
                continue;
            }
            let target = match (tr.is_last, tr.discount) {
                (true, d) if d == 0.0 => tr.reward,
                (true, _) => continue,
                (false, d) => {
                    tr.reward
                        + self.discount_factor * d * self.q.max(next.observation.index())?
                }
            };
            let (s, a) = (tr.observation.index(), tr.action.index());
            let td = target - self.q.get(s, a)?;
            self.q.add(s, a, self.learning_rate * td)?;
            sq_err += td * td;
            n += 1;
        }
        trace!("{} TD updates in a batch of {}", n, batch.len());

        let loss = if n > 0 { sq_err / n as f32 } else { 0.0 };
        let mut info = LossInfo::new(loss);
        info.extra
            .insert("epsilon", RecordValue::Scalar(self.explorer.eps() as f32));
        Ok(info)
    }
}

impl<E> Agent<E, RingReplayBuffer<E::Obs, E::Act>> for QLearningAgent<E>
where
    E: Env,
    E::Obs: DiscreteObs,
    E::Act: DiscreteAct,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corridor::{Corridor, CorridorAct, CorridorObs};
    use stride_core::Transition;

    type Tr = Transition<CorridorObs, CorridorAct>;

    fn tr(s: usize, a: CorridorAct, reward: f32, discount: f32, is_last: bool) -> Tr {
        Transition {
            observation: CorridorObs(s),
            action: a,
            reward,
            discount,
            is_first: false,
            is_last,
        }
    }

    fn agent() -> QLearningAgent<Corridor> {
        let config = QLearningConfig::default()
            .n_states(3)
            .learning_rate(0.5)
            .discount_factor(0.9);
        QLearningAgent::build(config)
    }

    #[test]
    fn test_td_targets() -> Result<()> {
        let mut agent = agent();
        agent.q.add(2, 0, 2.0)?;
        let batch = WindowBatch {
            windows: vec![
                // Goes on: 0 + 0.9 * 1 * max Q(2) = 1.8
                vec![
                    tr(1, CorridorAct::Right, 0.0, 1.0, false),
                    tr(2, CorridorAct::Left, 0.0, 1.0, false),
                ],
                // Terminates: target is the reward
                vec![
                    tr(0, CorridorAct::Right, 1.0, 0.0, true),
                    tr(0, CorridorAct::Left, 0.0, 1.0, false),
                ],
                // Truncated: skipped
                vec![
                    tr(2, CorridorAct::Right, 0.0, 1.0, true),
                    tr(0, CorridorAct::Left, 0.0, 1.0, false),
                ],
            ],
            ix_sample: vec![0, 1, 2],
        };

        let info = agent.update(batch)?;
        assert!((agent.q.get(1, 1)? - 0.9).abs() < 1e-6);
        assert!((agent.q.get(0, 1)? - 0.5).abs() < 1e-6);
        assert_eq!(agent.q.get(2, 1)?, 0.0);
        assert!((info.loss - (1.8 * 1.8 + 1.0) / 2.0).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_skips_window_across_reset() -> Result<()> {
        let mut agent = agent();
        agent.learning_rate = 1.0;
        agent.q.add(0, 1, 10.0)?;
        let mut next = tr(0, CorridorAct::Right, 0.0, 1.0, false);
        next.is_first = true;
        let batch = WindowBatch {
            windows: vec![vec![tr(2, CorridorAct::Right, 0.0, 1.0, false), next]],
            ix_sample: vec![0],
        };

        let info = agent.update(batch)?;
        assert_eq!(agent.q.get(2, 1)?, 0.0);
        assert_eq!(info.loss, 0.0);
        Ok(())
    }

    #[test]
    fn test_window_must_be_two() {
        let mut agent = agent();
        let batch = WindowBatch {
            windows: vec![vec![tr(0, CorridorAct::Right, 0.0, 1.0, false)]],
            ix_sample: vec![0],
        };
        assert!(agent.update(batch).is_err());
    }

    #[test]
    fn test_greedy_in_eval_mode() -> Result<()> {
        let mut agent = agent();
        agent.q.add(0, 0, 1.0)?;
        Agent::<Corridor, RingReplayBuffer<CorridorObs, CorridorAct>>::eval(&mut agent);
        for _ in 0..20 {
            let step = agent.action(&CorridorObs(0), ())?;
            assert_eq!(step.act, CorridorAct::Left);
        }
        Ok(())
    }
}
