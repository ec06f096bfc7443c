//! Errors in the library.
use std::fmt;
use thiserror::Error;

/// Component of the training loop in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Interaction between the environment and the policy.
    Collector,

    /// Batch construction from the replay buffer.
    ReplayBuffer,

    /// Optimization step of the agent.
    Learner,

    /// Evaluation of the agent.
    Evaluator,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Collector => "collector",
            Self::ReplayBuffer => "replay buffer",
            Self::Learner => "learner",
            Self::Evaluator => "evaluator",
        };
        f.write_str(name)
    }
}

/// Errors in the library.
#[derive(Error, Debug)]
pub enum StrideError {
    /// Malformed configuration or argument, e.g., a zero batch size or interval.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Sampling was requested before enough transitions were stored.
    #[error("Insufficient data: {required} transitions required, {available} available")]
    InsufficientData {
        /// Number of transitions needed by the request.
        required: usize,

        /// Number of transitions currently stored.
        available: usize,
    },

    /// The training loop was aborted.
    ///
    /// This variant is attached as context to the error returned by the failing component,
    /// which stays reachable as the root cause.
    #[error("The {component} failed at iteration {iteration}")]
    Aborted {
        /// The failing component.
        component: Component,

        /// Number of optimization steps completed before the failure.
        iteration: usize,
    },

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}
