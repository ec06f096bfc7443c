#![warn(missing_docs)]
//! Experience collection and training loop core for reinforcement learning.
//!
//! The crate wires an environment ([`Env`]), a policy ([`Policy`]), a replay buffer
//! ([`ReplayBufferBase`]) and an opaque learner ([`Learner`]) together:
//!
//! * [`Collector`] drives the interaction between an environment and a policy for a fixed
//!   number of steps or episodes and pushes [`Transition`]s into a replay buffer.
//! * [`replay_buffer`] provides a fixed-capacity ring buffer for off-policy agents and an
//!   episodic buffer, drained on every update, for on-policy agents.
//! * [`Trainer`] alternates collection and optimization, evaluates the agent periodically
//!   with an [`Evaluator`] and emits metrics through [`record`].
pub mod dummy;
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{
    Act, Agent, Configurable, Env, ExperienceBufferBase, Info, Learner, LossInfo, Obs, Policy,
    PolicyStep, ReplayBufferBase, Step, Transition,
};

mod collector;
pub use collector::{CollectMode, CollectStats, Collector};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};

mod trainer;
pub use trainer::{Phase, StopHandle, TrainReport, Trainer, TrainerConfig};
