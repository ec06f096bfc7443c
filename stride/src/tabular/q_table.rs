use crate::tabular::EpsilonGreedy;
use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use stride_core::error::StrideError;

/// Action values of all state-action pairs.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct QTable {
    n_states: usize,
    n_actions: usize,
    values: Vec<f32>,
}

impl QTable {
    /// Constructs a table filled with zeros.
    pub fn new(n_states: usize, n_actions: usize) -> Self {
        Self {
            n_states,
            n_actions,
            values: vec![0.0; n_states * n_actions],
        }
    }

    /// Returns the number of states.
    pub fn n_states(&self) -> usize {
        self.n_states
    }

    /// Returns the number of actions.
    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Returns the index of `(s, a)` in the flattened table.
    pub(crate) fn ix(&self, s: usize, a: usize) -> Result<usize> {
        if s >= self.n_states || a >= self.n_actions {
            return Err(StrideError::InvalidArgument(format!(
                "({}, {}) is out of the table of {} states and {} actions",
                s, a, self.n_states, self.n_actions
            ))
            .into());
        }
        Ok(s * self.n_actions + a)
    }

    /// Returns the value of `(s, a)`.
    pub fn get(&self, s: usize, a: usize) -> Result<f32> {
        Ok(self.values[self.ix(s, a)?])
    }

    /// Adds `delta` to the value of `(s, a)`.
    pub fn add(&mut self, s: usize, a: usize, delta: f32) -> Result<()> {
        let ix = self.ix(s, a)?;
        self.values[ix] += delta;
        Ok(())
    }

    /// Returns the values of the actions in state `s`.
    pub fn row(&self, s: usize) -> Result<&[f32]> {
        let start = self.ix(s, 0)?;
        Ok(&self.values[start..start + self.n_actions])
    }

    /// Returns the maximum action value in state `s`.
    pub fn max(&self, s: usize) -> Result<f32> {
        Ok(self
            .row(s)?
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max))
    }

    /// Returns an action with the maximum value in state `s`. Ties are broken at random.
    pub fn greedy(&self, s: usize, rng: &mut impl Rng) -> Result<usize> {
        let row = self.row(s)?;
        let max = self.max(s)?;
        let best = (0..self.n_actions)
            .filter(|&a| row[a] == max)
            .collect::<Vec<_>>();
        if best.is_empty() {
            return Err(StrideError::InvalidArgument(format!(
                "no comparable action value in state {}: {:?}",
                s, row
            ))
            .into());
        }
        Ok(best[rng.gen_range(0..best.len())])
    }

    /// Returns an action of the epsilon-greedy policy in training mode, or of the greedy
    /// policy otherwise.
    pub(crate) fn select(
        &self,
        s: usize,
        explorer: &mut EpsilonGreedy,
        is_train: bool,
        rng: &mut impl Rng,
    ) -> Result<usize> {
        match is_train {
            true => explorer.action(self, s, rng),
            false => self.greedy(s, rng),
        }
    }

    /// Loads the table from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        Ok(serde_yaml::from_reader(rdr)?)
    }

    /// Saves the table in a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
