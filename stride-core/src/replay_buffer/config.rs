//! Configuration of replay buffers.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`RingReplayBuffer`](super::RingReplayBuffer).
///
/// # Examples
///
/// ```rust
/// use stride_core::replay_buffer::RingReplayBufferConfig;
///
/// let config = RingReplayBufferConfig::default()
///     .capacity(100_000)
///     .window(2)
///     .seed(42);
/// ```
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct RingReplayBufferConfig {
    /// Maximum number of transitions that can be stored in the buffer.
    /// When the buffer is full, new transitions replace the oldest ones.
    pub capacity: usize,

    /// Random seed used for sampling transitions.
    pub seed: u64,

    /// Number of contiguous transitions in each sample of a batch.
    pub window: usize,
}

impl Default for RingReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            seed: 42,
            window: 1,
        }
    }
}

impl RingReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the number of contiguous transitions in each sample.
    pub fn window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Configuration of [`EpisodicBuffer`](super::EpisodicBuffer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct EpisodicBufferConfig {
    /// Number of transitions allocated up front.
    ///
    /// The buffer grows past this value; it is bounded only by memory.
    pub capacity_hint: usize,
}

impl EpisodicBufferConfig {
    /// Sets the number of transitions allocated up front.
    pub fn capacity_hint(mut self, capacity_hint: usize) -> Self {
        self.capacity_hint = capacity_hint;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_ring_replay_buffer_config() -> Result<()> {
        let config = RingReplayBufferConfig::default()
            .capacity(500)
            .window(2)
            .seed(7);

        let dir = TempDir::new("ring_replay_buffer_config")?;
        let path = dir.path().join("replay_buffer.yaml");
        config.save(&path)?;
        let config_ = RingReplayBufferConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
