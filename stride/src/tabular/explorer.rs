//! Exploration strategy of tabular agents.
use super::QTable;
use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Epsilon-greedy explorer.
///
/// Epsilon decays linearly from `eps_start` to `eps_final` over `final_step` actions.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// The number of actions taken so far.
    pub n_steps: usize,

    /// Epsilon at the beginning.
    pub eps_start: f64,

    /// Epsilon after `final_step` actions.
    pub eps_final: f64,

    /// The number of actions over which epsilon decays.
    pub final_step: usize,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            n_steps: 0,
            eps_start: 1.0,
            eps_final: 0.05,
            final_step: 1000,
        }
    }
}

impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer decaying over `final_step` actions.
    pub fn with_final_step(final_step: usize) -> Self {
        Self {
            final_step,
            ..Default::default()
        }
    }

    /// Set the epsilon value at the final step.
    pub fn eps_final(mut self, v: f64) -> Self {
        self.eps_final = v;
        self
    }

    /// Set the epsilon value at the start.
    pub fn eps_start(mut self, v: f64) -> Self {
        self.eps_start = v;
        self
    }

    /// Returns the current epsilon.
    pub fn eps(&self) -> f64 {
        if self.final_step == 0 {
            return self.eps_final;
        }
        let d = (self.eps_start - self.eps_final) / (self.final_step as f64);
        (self.eps_start - d * self.n_steps as f64).max(self.eps_final)
    }

    /// Takes an action in state `s`.
    pub fn action(&mut self, q: &QTable, s: usize, rng: &mut impl Rng) -> Result<usize> {
        let is_random = rng.gen::<f64>() < self.eps();
        self.n_steps += 1;

        match is_random {
            true => Ok(rng.gen_range(0..q.n_actions())),
            false => q.greedy(s, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eps_decays_linearly() {
        let mut explorer = EpsilonGreedy::with_final_step(10).eps_final(0.1);
        assert_eq!(explorer.eps(), 1.0);
        explorer.n_steps = 5;
        assert!((explorer.eps() - 0.55).abs() < 1e-9);
        explorer.n_steps = 100;
        assert_eq!(explorer.eps(), 0.1);
    }
}
