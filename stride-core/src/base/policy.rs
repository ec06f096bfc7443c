//! Policy.
use super::Env;
use crate::record::Record;
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Output of [`Policy::action()`].
#[derive(Debug, Clone)]
pub struct PolicyStep<A, S> {
    /// Action.
    pub act: A,

    /// State to be given to the next call of [`Policy::action()`] in the same episode.
    pub state: S,

    /// Information defined by the policy.
    pub info: Record,
}

impl<A, S> PolicyStep<A, S> {
    /// Constructs a [`PolicyStep`] without additional information.
    pub fn new(act: A, state: S) -> Self {
        Self {
            act,
            state,
            info: Record::empty(),
        }
    }
}

/// A policy on an environment.
///
/// Policy is a mapping from an observation to an action.
/// The mapping can be either of deterministic or stochastic.
///
/// Recurrent policies do not keep their state inside the object: the state is returned
/// in [`PolicyStep`] and handed back by the caller on the next call. Stateless policies
/// use `()`.
pub trait Policy<E: Env> {
    /// State threaded through the steps of an episode.
    type State: Clone;

    /// Returns the state at the beginning of an episode.
    fn initial_state(&self) -> Self::State;

    /// Computes an action given an observation and the current state.
    fn action(
        &mut self,
        obs: &E::Obs,
        state: Self::State,
    ) -> Result<PolicyStep<E::Act, Self::State>>;
}

/// A configurable object.
pub trait Configurable {
    /// Configuration.
    type Config: Clone + DeserializeOwned;

    /// Builds the object.
    fn build(config: Self::Config) -> Self;

    /// Build the object with the configuration in the yaml file of the given path.
    fn build_from_path(path: impl AsRef<Path>) -> Result<Self>
    where
        Self: Sized,
    {
        let file = std::fs::File::open(path)?;
        let rdr = std::io::BufReader::new(file);
        let config = serde_yaml::from_reader(rdr)?;
        Ok(Self::build(config))
    }
}
