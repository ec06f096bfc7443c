//! Environment step.
use super::Env;

/// Additional information to `Obs` and `Act`.
pub trait Info {}

impl Info for () {}

/// Represents the outcome of an environment step: observation, reward and
/// episode boundary flags, with some additional information.
///
/// An environment emits a [`Step`] object at every interaction step.
/// [`Collector`](crate::Collector) turns it into a [`Transition`](crate::Transition)
/// together with the previous observation and the action taken.
pub struct Step<E: Env> {
    /// Observation after the step.
    pub obs: E::Obs,

    /// Reward.
    pub reward: f32,

    /// Discount applied to the value of the next observation.
    pub discount: f32,

    /// Flag denoting if episode is terminated.
    pub is_terminated: bool,

    /// Flag denoting if episode is truncated.
    pub is_truncated: bool,

    /// Information defined by user.
    pub info: E::Info,
}

impl<E: Env> Step<E> {
    /// Constructs a [`Step`] object.
    pub fn new(
        obs: E::Obs,
        reward: f32,
        discount: f32,
        is_terminated: bool,
        is_truncated: bool,
        info: E::Info,
    ) -> Self {
        Step {
            obs,
            reward,
            discount,
            is_terminated,
            is_truncated,
            info,
        }
    }

    /// A step in the middle of an episode, with discount 1.
    pub fn transition(obs: E::Obs, reward: f32, info: E::Info) -> Self {
        Self::new(obs, reward, 1.0, false, false, info)
    }

    /// A step reaching a terminal state, with discount 0.
    pub fn termination(obs: E::Obs, reward: f32, info: E::Info) -> Self {
        Self::new(obs, reward, 0.0, true, false, info)
    }

    /// A step cut off by a time limit. The discount stays 1 as the episode could continue.
    pub fn truncation(obs: E::Obs, reward: f32, info: E::Info) -> Self {
        Self::new(obs, reward, 1.0, false, true, info)
    }

    #[inline]
    /// Terminated or truncated.
    pub fn is_done(&self) -> bool {
        self.is_terminated || self.is_truncated
    }
}
