//! Every-visit Monte Carlo control.
use super::{DiscreteAct, DiscreteObs, EpsilonGreedy, QTable};
use anyhow::Result;
use log::debug;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use stride_core::{
    record::RecordValue,
    replay_buffer::{EpisodeBatch, EpisodicBuffer},
    Agent, Configurable, Env, Learner, LossInfo, Policy, PolicyStep,
};

/// Configuration of [`MonteCarloAgent`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct MonteCarloConfig {
    /// The number of states.
    pub n_states: usize,

    /// Discount factor.
    pub discount_factor: f32,

    /// Exploration in training mode.
    pub explorer: EpsilonGreedy,

    /// Random seed of exploration and tie breaking.
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            n_states: 5,
            discount_factor: 0.99,
            explorer: EpsilonGreedy::default(),
            seed: 42,
        }
    }
}

impl MonteCarloConfig {
    /// Sets the number of states.
    pub fn n_states(mut self, v: usize) -> Self {
        self.n_states = v;
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
}

/// On-policy agent estimating action values by averaging observed returns.
///
/// Each batch holds the episodes collected since the previous update. Every visit of
/// a state-action pair moves its value towards the return from that visit, with step
/// size `1 / n` where `n` is the number of visits so far. Episodes without a closing
/// transition are ignored.
pub struct MonteCarloAgent<E> {
    q: QTable,
    visits: Vec<u32>,
    discount_factor: f32,
    explorer: EpsilonGreedy,
    rng: StdRng,
    is_train: bool,
    phantom: PhantomData<E>,
}

impl<E> MonteCarloAgent<E> {
    /// Returns the action values.
    pub fn q_table(&self) -> &QTable {
        &self.q
    }
}

impl<E> Configurable for MonteCarloAgent<E>
where
    E: Env,
    E::Act: DiscreteAct,
{
    type Config = MonteCarloConfig;

    fn build(config: Self::Config) -> Self {
        Self {
            q: QTable::new(config.n_states, E::Act::N),
            visits: vec![0; config.n_states * E::Act::N],
            discount_factor: config.discount_factor,
            explorer: config.explorer,
            rng: StdRng::seed_from_u64(config.seed),
            is_train: true,
            phantom: PhantomData,
        }
    }
}

impl<E> Policy<E> for MonteCarloAgent<E>
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

impl<E> Learner<EpisodeBatch<E::Obs, E::Act>> for MonteCarloAgent<E>
where
    E: Env,
    E::Obs: DiscreteObs,
    E::Act: DiscreteAct,
{
    fn update(&mut self, batch: EpisodeBatch<E::Obs, E::Act>) -> Result<LossInfo> {
        let mut sq_err = 0f32;
        let mut n = 0;
        let mut n_episodes = 0;

        for episode in batch.episodes() {
            if !episode.last().is_some_and(|tr| tr.is_last) {
                debug!("Skips an incomplete episode of {} steps", episode.len());
                continue;
            }
            n_episodes += 1;

            let mut g = 0f32;
            for tr in episode.iter().rev() {
                g = tr.reward + self.discount_factor * tr.discount * g;
                let (s, a) = (tr.observation.index(), tr.action.index());
                let ix = self.q.ix(s, a)?;
                self.visits[ix] += 1;
                let err = g - self.q.get(s, a)?;
                self.q.add(s, a, err / self.visits[ix] as f32)?;
                sq_err += err * err;
                n += 1;
            }
        }

        let loss = if n > 0 { sq_err / n as f32 } else { 0.0 };
        let mut info = LossInfo::new(loss);
        info.extra
            .insert("n_episodes", RecordValue::Scalar(n_episodes as f32));
        Ok(info)
    }
}

impl<E> Agent<E, EpisodicBuffer<E::Obs, E::Act>> for MonteCarloAgent<E>
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

    fn tr(s: usize, reward: f32, discount: f32, is_last: bool) -> Tr {
        Transition {
            observation: CorridorObs(s),
            action: CorridorAct::Right,
            reward,
            discount,
            is_first: false,
            is_last,
        }
    }

    #[test]
    fn test_every_visit_returns() -> Result<()> {
        let config = MonteCarloConfig::default().n_states(3).discount_factor(0.5);
        let mut agent: MonteCarloAgent<Corridor> = MonteCarloAgent::build(config);
        let batch = EpisodeBatch {
            transitions: vec![
                tr(0, 0.0, 1.0, false),
                tr(1, 1.0, 0.0, true),
                tr(0, 0.0, 1.0, false),
                tr(1, 0.0, 1.0, false),
            ],
        };

        let info = agent.update(batch)?;
        assert_eq!(agent.q_table().get(1, 1)?, 1.0);
        assert_eq!(agent.q_table().get(0, 1)?, 0.5);
        assert_eq!(agent.visits.iter().sum::<u32>(), 2);
        assert!((info.loss - (1.0 + 0.25) / 2.0).abs() < 1e-6);
        Ok(())
    }
}
