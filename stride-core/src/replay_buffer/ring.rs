//! Fixed-capacity ring replay buffer.
use super::{RingReplayBufferConfig, WindowBatch};
use crate::{error::StrideError, ExperienceBufferBase, ReplayBufferBase, Transition};
use anyhow::Result;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A replay buffer of fixed capacity for off-policy agents.
///
/// Transitions are written at the next position of a ring. Once the buffer is full,
/// each push overwrites the oldest transition.
///
/// # Examples
///
/// ```ignore
/// let config = RingReplayBufferConfig::default().capacity(10000).window(2);
/// let mut buffer = RingReplayBuffer::<Obs, Act>::build(&config)?;
///
/// // Add transitions
/// buffer.push(transition)?;
///
/// // Sample 32 windows of 2 contiguous transitions
/// let batch = buffer.batch(32)?;
/// ```
pub struct RingReplayBuffer<O, A> {
    /// Maximum number of transitions that can be stored.
    capacity: usize,

    /// Physical index of the next write.
    i: usize,

    /// Storage, which grows until reaching `capacity`.
    data: Vec<Transition<O, A>>,

    /// Number of contiguous transitions in each sample of [`ReplayBufferBase::batch()`].
    window: usize,

    /// Random number generator for sampling.
    rng: StdRng,
}

impl<O, A> RingReplayBuffer<O, A>
where
    O: Clone,
    A: Clone,
{
    /// Returns the maximum number of transitions.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Physical index of the transition at the logical index `j`,
    /// where `j == 0` is the oldest stored transition.
    #[inline]
    fn physical(&self, j: usize) -> usize {
        if self.data.len() < self.capacity {
            j
        } else {
            (self.i + j) % self.capacity
        }
    }

    /// Returns an iterator over stored transitions from the oldest to the newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition<O, A>> + '_ {
        (0..self.data.len()).map(move |j| &self.data[self.physical(j)])
    }

    /// Draws `batch_size` windows of `window` contiguous transitions.
    ///
    /// Start positions are drawn independently and uniformly over the populated range,
    /// so the same window can appear more than once in a batch.
    ///
    /// # Errors
    ///
    /// * [`StrideError::InvalidArgument`] if `batch_size` or `window` is zero.
    /// * [`StrideError::InsufficientData`] if fewer than `window` transitions are stored.
    pub fn sample(&mut self, batch_size: usize, window: usize) -> Result<WindowBatch<O, A>> {
        if batch_size == 0 {
            return Err(StrideError::InvalidArgument("batch_size must be positive".into()).into());
        }
        if window == 0 {
            return Err(StrideError::InvalidArgument("window must be positive".into()).into());
        }
        let len = self.data.len();
        if len < window {
            return Err(StrideError::InsufficientData {
                required: window,
                available: len,
            }
            .into());
        }

        let n_starts = len - window + 1;
        let ix_sample = (0..batch_size)
            .map(|_| self.rng.gen_range(0..n_starts))
            .collect::<Vec<_>>();
        let windows = ix_sample
            .iter()
            .map(|&start| {
                (start..start + window)
                    .map(|j| self.data[self.physical(j)].clone())
                    .collect()
            })
            .collect();

        Ok(WindowBatch { windows, ix_sample })
    }

    /// Returns the number of transitions closing an episode.
    pub fn num_last_flags(&self) -> usize {
        self.data.iter().filter(|tr| tr.is_last).count()
    }

    /// Returns the sum of all rewards in the buffer.
    pub fn sum_rewards(&self) -> f32 {
        self.data.iter().map(|tr| tr.reward).sum()
    }
}

impl<O, A> ExperienceBufferBase for RingReplayBuffer<O, A>
where
    O: Clone,
    A: Clone,
{
    type Item = Transition<O, A>;

    fn len(&self) -> usize {
        self.data.len()
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        if self.data.len() < self.capacity {
            self.data.push(tr);
        } else {
            self.data[self.i] = tr;
        }
        self.i = (self.i + 1) % self.capacity;
        Ok(())
    }
}

impl<O, A> ReplayBufferBase for RingReplayBuffer<O, A>
where
    O: Clone,
    A: Clone,
{
    type Config = RingReplayBufferConfig;
    type Batch = WindowBatch<O, A>;
    const ON_POLICY: bool = false;

    fn build(config: &Self::Config) -> Result<Self> {
        if config.capacity == 0 {
            return Err(StrideError::InvalidArgument("capacity must be positive".into()).into());
        }
        if config.window == 0 {
            return Err(StrideError::InvalidArgument("window must be positive".into()).into());
        }

        Ok(Self {
            capacity: config.capacity,
            i: 0,
            data: Vec::with_capacity(config.capacity),
            window: config.window,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        self.sample(size, self.window)
    }
}
