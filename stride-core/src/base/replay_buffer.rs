//! Replay buffer interface for reinforcement learning.
//!
//! Replay buffers decouple the rate of collecting experiences from the rate of
//! consuming them in optimization steps.
use anyhow::Result;

/// Interface for buffers that store experiences from environments.
///
/// # Examples
///
/// ```ignore
/// struct SimpleBuffer<T> {
///     items: Vec<T>,
/// }
///
/// impl<T> ExperienceBufferBase for SimpleBuffer<T> {
///     type Item = T;
///
///     fn push(&mut self, tr: T) -> Result<()> {
///         self.items.push(tr);
///         Ok(())
///     }
///
///     fn len(&self) -> usize {
///         self.items.len()
///     }
/// }
/// ```
pub trait ExperienceBufferBase {
    /// The type of items stored in the buffer.
    type Item;

    /// Pushes a new experience into the buffer.
    fn push(&mut self, tr: Self::Item) -> Result<()>;

    /// Returns the current number of experiences in the buffer.
    fn len(&self) -> usize;

    /// Returns `true` if the buffer holds no experience.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Interface for replay buffers that generate batches for training.
pub trait ReplayBufferBase {
    /// Configuration parameters for the replay buffer.
    type Config: Clone;

    /// The type of batch generated for training.
    type Batch;

    /// If `true`, every batch consumes all stored experiences, so that each
    /// optimization step sees only data collected with the current policy.
    const ON_POLICY: bool;

    /// Builds a new replay buffer from the given configuration.
    ///
    /// Fails with [`StrideError::InvalidArgument`](crate::error::StrideError::InvalidArgument)
    /// on a malformed configuration.
    fn build(config: &Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Constructs a batch of experiences for an optimization step.
    ///
    /// `size` is the number of samples for buffers drawing random samples.
    /// On-policy buffers ignore it and return everything they hold.
    fn batch(&mut self, size: usize) -> Result<Self::Batch>;
}
