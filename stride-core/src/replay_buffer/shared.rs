//! Replay buffer shared by multiple collectors.
use crate::{ExperienceBufferBase, ReplayBufferBase};
use anyhow::Result;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A handle of a replay buffer shared among threads.
///
/// Clones of the handle refer to the same buffer. Every operation holds the mutex
/// for its whole duration, so pushes are serialized and a batch never observes a
/// partially written transition.
pub struct SharedReplayBuffer<R> {
    inner: Arc<Mutex<R>>,
}

impl<R> Clone for SharedReplayBuffer<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R> SharedReplayBuffer<R> {
    /// Wraps a replay buffer.
    pub fn new(buffer: R) -> Self {
        Self {
            inner: Arc::new(Mutex::new(buffer)),
        }
    }

    // Wrapped buffers never panic halfway through a mutation, so a poisoned lock still guards valid data.
    fn lock(&self) -> MutexGuard<'_, R> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` with exclusive access to the wrapped buffer.
    pub fn with<T>(&self, f: impl FnOnce(&mut R) -> T) -> T {
        let mut guard = self.lock();
        f(&mut *guard)
    }
}

impl<R: ExperienceBufferBase> ExperienceBufferBase for SharedReplayBuffer<R> {
    type Item = R::Item;

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        self.lock().push(tr)
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}

impl<R: ReplayBufferBase> ReplayBufferBase for SharedReplayBuffer<R> {
    type Config = R::Config;
    type Batch = R::Batch;
    const ON_POLICY: bool = R::ON_POLICY;

    fn build(config: &Self::Config) -> Result<Self> {
        Ok(Self::new(R::build(config)?))
    }

    fn batch(&mut self, size: usize) -> Result<Self::Batch> {
        self.lock().batch(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        replay_buffer::{RingReplayBuffer, RingReplayBufferConfig},
        Transition,
    };
    use std::thread;

    fn tr(worker: usize, k: usize) -> Transition<(usize, usize), usize> {
        Transition {
            observation: (worker, k),
            action: 0,
            reward: 0.0,
            discount: 1.0,
            is_first: k == 0,
            is_last: false,
        }
    }

    #[test]
    fn test_concurrent_pushes() -> Result<()> {
        let config = RingReplayBufferConfig::default().capacity(1000);
        let buffer = SharedReplayBuffer::<RingReplayBuffer<(usize, usize), usize>>::build(&config)?;

        thread::scope(|s| {
            for worker in 0..4 {
                let mut handle = buffer.clone();
                s.spawn(move || {
                    for k in 0..100 {
                        handle.push(tr(worker, k)).unwrap();
                    }
                });
            }
        });

        assert_eq!(buffer.len(), 400);

        // Transitions of each worker keep their relative order
        buffer.with(|b| {
            for worker in 0..4 {
                let ks: Vec<usize> = b
                    .iter()
                    .filter(|tr| tr.observation.0 == worker)
                    .map(|tr| tr.observation.1)
                    .collect();
                assert_eq!(ks, (0..100).collect::<Vec<_>>());
            }
        });

        let mut handle = buffer.clone();
        let batch = handle.batch(8)?;
        assert_eq!(batch.len(), 8);
        Ok(())
    }
}
