//! Environment.
use super::{Act, Info, Obs, Step};
use crate::record::Record;
use anyhow::Result;

/// Represents an environment, typically an MDP.
///
/// Errors returned by the methods of this trait are propagated unchanged to the caller
/// of [`Collector::run()`](crate::Collector::run) and [`Trainer::train()`](crate::Trainer::train).
/// They are never retried.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [`Step`] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Resets the environment and returns the initial observation of a new episode.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Resets the environment with a given index.
    ///
    /// The index is used in an arbitrary way. For example, it can be used as a random seed,
    /// which is useful when evaluating a trained agent. This method is called in
    /// [`DefaultEvaluator`](crate::DefaultEvaluator). The default implementation ignores
    /// the index.
    #[allow(unused_variables)]
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.reset()
    }

    /// Performes an environment step.
    ///
    /// The returned [`Record`] holds environment specific information, which is
    /// merged into the metrics of the training loop.
    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)>
    where
        Self: Sized;
}
