//! Tabular agents for environments with discrete observations and actions.
//!
//! Action values are kept in a [`QTable`]. No gradient is involved: the optimization
//! step of [`QLearningAgent`] is a TD update over sampled windows of two transitions,
//! and that of [`MonteCarloAgent`] an every-visit update of returns over whole episodes.
mod explorer;
mod monte_carlo;
mod q_learning;
mod q_table;
pub use explorer::EpsilonGreedy;
pub use monte_carlo::{MonteCarloAgent, MonteCarloConfig};
pub use q_learning::{QLearningAgent, QLearningConfig};
pub use q_table::QTable;

/// Observation with a finite number of values.
pub trait DiscreteObs {
    /// Returns the index of the observation.
    fn index(&self) -> usize;
}

/// Action with a finite number of values.
pub trait DiscreteAct {
    /// The number of actions.
    const N: usize;

    /// Returns the index of the action.
    fn index(&self) -> usize;

    /// Constructs an action from its index.
    fn from_index(ix: usize) -> Self;
}
