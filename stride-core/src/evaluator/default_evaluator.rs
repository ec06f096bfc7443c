//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{
    error::StrideError,
    record::{Record, RecordValue},
    Env, Policy, PolicyStep,
};
use anyhow::Result;
use log::{debug, trace};

/// Runs a fixed number of episodes and reports the average return.
///
/// The evaluator owns its own environment, so that evaluation never interferes with
/// the episode in progress in the [`Collector`](crate::Collector). The `ix`-th episode
/// starts with [`Env::reset_with_index()`]`(ix)`.
///
/// The returned [`Record`] has two entries:
///
/// * `average_return` - mean total reward over the episodes.
/// * `episode_returns` - total reward of each episode.
///
/// # Examples
///
/// ```ignore
/// let env = Corridor::build(&config, 42)?;
/// let mut evaluator = DefaultEvaluator::new(env, 10)?;
/// let record = evaluator.evaluate(&mut agent)?;
/// println!("Average return: {}", record.get_scalar("average_return")?);
/// ```
pub struct DefaultEvaluator<E: Env> {
    /// The environment instance used for evaluation.
    env: E,

    /// The number of episodes to run during evaluation.
    n_episodes: usize,

    /// Episodes longer than this are cut off.
    max_episode_steps: Option<usize>,
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    ///
    /// Fails with [`StrideError::InvalidArgument`] if `n_episodes` is zero.
    pub fn new(env: E, n_episodes: usize) -> Result<Self> {
        if n_episodes == 0 {
            return Err(StrideError::InvalidArgument(
                "n_episodes must be positive".to_string(),
            )
            .into());
        }
        Ok(Self {
            env,
            n_episodes,
            max_episode_steps: None,
        })
    }

    /// Caps the length of evaluation episodes.
    pub fn max_episode_steps(mut self, v: usize) -> Self {
        self.max_episode_steps = Some(v);
        self
    }

    /// Returns a reference to the environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Returns the number of episodes of an evaluation.
    pub fn n_episodes(&self) -> usize {
        self.n_episodes
    }

    fn run_episode<P: Policy<E>>(&mut self, policy: &mut P, ix: usize) -> Result<f32> {
        let mut obs = self.env.reset_with_index(ix)?;
        let mut state = policy.initial_state();
        let mut r_total = 0f32;
        let mut t = 0;

        loop {
            let PolicyStep { act, state: next, .. } = policy.action(&obs, state)?;
            let (step, _) = self.env.step(&act)?;
            r_total += step.reward;
            t += 1;
            if step.is_done() {
                break;
            }
            if self.max_episode_steps.is_some_and(|max| t >= max) {
                trace!("Evaluation episode {} cut off at {} steps", ix, t);
                break;
            }
            obs = step.obs;
            state = next;
        }

        Ok(r_total)
    }
}

impl<E, P> Evaluator<E, P> for DefaultEvaluator<E>
where
    E: Env,
    P: Policy<E>,
{
    fn evaluate(&mut self, policy: &mut P) -> Result<Record> {
        let returns = (0..self.n_episodes)
            .map(|ix| self.run_episode(policy, ix))
            .collect::<Result<Vec<_>>>()?;
        let average = returns.iter().sum::<f32>() / self.n_episodes as f32;
        debug!("Evaluated {} episodes: average return = {}", self.n_episodes, average);

        Ok(Record::from_slice(&[
            ("average_return", RecordValue::Scalar(average)),
            ("episode_returns", RecordValue::Array1(returns)),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::{DummyAgent, DummyEnv, DummyEnvConfig};
    use test_log::test;

    #[test]
    fn test_evaluate() -> Result<()> {
        let config = DummyEnvConfig::default().episode_lengths(vec![2, 4]);
        let env = DummyEnv::build(&config, 0)?;
        let mut evaluator = DefaultEvaluator::new(env, 2)?;
        let mut agent = DummyAgent::new();

        let record = evaluator.evaluate(&mut agent)?;
        assert_eq!(record.get_scalar("average_return")?, 3.0);
        assert_eq!(record.get_array1("episode_returns")?, vec![2.0, 4.0]);
        assert_eq!(evaluator.env().n_resets(), 2);
        Ok(())
    }

    #[test]
    fn test_max_episode_steps() -> Result<()> {
        let config = DummyEnvConfig::default().episode_lengths(vec![10]);
        let env = DummyEnv::build(&config, 0)?;
        let mut evaluator = DefaultEvaluator::new(env, 3)?.max_episode_steps(4);
        let record = evaluator.evaluate(&mut DummyAgent::new())?;
        assert_eq!(record.get_scalar("average_return")?, 4.0);
        Ok(())
    }

    #[test]
    fn test_zero_episodes() -> Result<()> {
        let env = DummyEnv::build(&DummyEnvConfig::default(), 0)?;
        let err = DefaultEvaluator::new(env, 0).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<StrideError>(),
            Some(StrideError::InvalidArgument(_))
        ));
        Ok(())
    }
}
