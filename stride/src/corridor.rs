//! A one-dimensional corridor.
use crate::tabular::{DiscreteAct, DiscreteObs};
use anyhow::{bail, Result};
use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use stride_core::{error::StrideError, record::Record, Act, Env, Obs, Step};

/// Position of the agent in the corridor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CorridorObs(pub usize);

impl Obs for CorridorObs {}

impl DiscreteObs for CorridorObs {
    fn index(&self) -> usize {
        self.0
    }
}

/// Move to the left or to the right.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorridorAct {
    /// Decrements the position.
    Left,

    /// Increments the position.
    Right,
}

impl CorridorAct {
    fn flip(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl Act for CorridorAct {}

impl DiscreteAct for CorridorAct {
    const N: usize = 2;

    fn index(&self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    fn from_index(ix: usize) -> Self {
        match ix {
            0 => Self::Left,
            _ => Self::Right,
        }
    }
}

/// Configuration of [`Corridor`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CorridorConfig {
    /// The number of positions. The agent starts at 0 and the goal is at `length - 1`.
    pub length: usize,

    /// Episodes are truncated after this number of steps.
    pub max_steps: usize,

    /// Probability that an action moves the agent in the opposite direction.
    pub slip_prob: f32,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            length: 5,
            max_steps: 50,
            slip_prob: 0.0,
        }
    }
}

impl CorridorConfig {
    /// Sets the number of positions.
    pub fn length(mut self, v: usize) -> Self {
        self.length = v;
        self
    }

    /// Sets the maximum length of an episode.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the slip probability.
    pub fn slip_prob(mut self, v: f32) -> Self {
        self.slip_prob = v;
        self
    }

    /// Constructs [`CorridorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`CorridorConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// A corridor with a goal at the right end.
///
/// Reaching the goal terminates the episode with reward 1. Every other step gives
/// reward 0, and the episode is truncated after `max_steps` steps. With a positive
/// `slip_prob`, actions are flipped at random.
pub struct Corridor {
    config: CorridorConfig,
    seed: u64,
    rng: StdRng,
    pos: usize,
    t: usize,
    done: bool,
}

impl Corridor {
    /// Returns the number of positions.
    pub fn n_states(&self) -> usize {
        self.config.length
    }

    fn reset_state(&mut self) -> CorridorObs {
        self.pos = 0;
        self.t = 0;
        self.done = false;
        CorridorObs(self.pos)
    }
}

impl Env for Corridor {
    type Config = CorridorConfig;
    type Obs = CorridorObs;
    type Act = CorridorAct;
    type Info = ();

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        if config.length < 2 {
            return Err(StrideError::InvalidArgument("length must be at least 2".into()).into());
        }
        if config.max_steps == 0 {
            return Err(StrideError::InvalidArgument("max_steps must be positive".into()).into());
        }
        if !(0.0..=1.0).contains(&config.slip_prob) {
            return Err(
                StrideError::InvalidArgument("slip_prob must be in [0, 1]".into()).into(),
            );
        }
        let seed = seed as u64;
        Ok(Self {
            config: config.clone(),
            seed,
            rng: StdRng::seed_from_u64(seed),
            pos: 0,
            t: 0,
            done: true,
        })
    }

    fn reset(&mut self) -> Result<CorridorObs> {
        Ok(self.reset_state())
    }

    /// Reseeds the slip noise with `seed + ix`, so that evaluations are reproducible.
    fn reset_with_index(&mut self, ix: usize) -> Result<CorridorObs> {
        self.rng = StdRng::seed_from_u64(self.seed.wrapping_add(ix as u64));
        Ok(self.reset_state())
    }

    fn step(&mut self, a: &CorridorAct) -> Result<(Step<Self>, Record)> {
        if self.done {
            bail!("step() called without reset");
        }

        let slip = self.config.slip_prob > 0.0 && self.rng.gen::<f32>() < self.config.slip_prob;
        let a = if slip { a.flip() } else { *a };
        self.pos = match a {
            CorridorAct::Left => self.pos.saturating_sub(1),
            CorridorAct::Right => (self.pos + 1).min(self.config.length - 1),
        };
        self.t += 1;
        trace!("t = {}, act = {:?}, slip = {}, pos = {}", self.t, a, slip, self.pos);

        let obs = CorridorObs(self.pos);
        let step = if self.pos == self.config.length - 1 {
            self.done = true;
            Step::termination(obs, 1.0, ())
        } else if self.t >= self.config.max_steps {
            self.done = true;
            Step::truncation(obs, 0.0, ())
        } else {
            Step::transition(obs, 0.0, ())
        };

        Ok((step, Record::empty()))
    }
}
