//! Core functionalities.
mod agent;
mod env;
mod policy;
mod replay_buffer;
mod step;
mod transition;
pub use agent::{Agent, Learner, LossInfo};
pub use env::Env;
pub use policy::{Configurable, Policy, PolicyStep};
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
use std::fmt::Debug;
pub use step::{Info, Step};
pub use transition::Transition;

/// An observation of an environment.
///
/// Vectorized environments are not supported, so an object of this trait
/// always represents a single observation.
pub trait Obs: Clone + Debug {}

/// An action of an environment.
pub trait Act: Clone + Debug {}
