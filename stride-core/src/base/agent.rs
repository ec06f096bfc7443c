//! Agent.
use super::{Env, Policy, ReplayBufferBase};
use crate::record::Record;
use anyhow::Result;

/// Output of an optimization step.
#[derive(Debug)]
pub struct LossInfo {
    /// Loss of the optimization step.
    pub loss: f32,

    /// Additional values reported by the learner.
    pub extra: Record,
}

impl LossInfo {
    /// Constructs [`LossInfo`] without additional values.
    pub fn new(loss: f32) -> Self {
        Self {
            loss,
            extra: Record::empty(),
        }
    }
}

/// Updates model parameters with a batch of experiences.
///
/// Network forward/backward passes and optimizers live behind this trait.
pub trait Learner<B> {
    /// Performs an optimization step.
    fn update(&mut self, batch: B) -> Result<LossInfo>;
}

/// Represents a trainable policy on an environment.
///
/// In training mode the agent acts as the behavioral policy used for collecting
/// experiences, e.g., with exploration noise. In evaluation mode it acts as the
/// greedy or deterministic policy.
pub trait Agent<E: Env, R: ReplayBufferBase>: Policy<E> + Learner<R::Batch> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;
}
