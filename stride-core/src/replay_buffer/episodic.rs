//! Episodic buffer for on-policy agents.
use super::{EpisodeBatch, EpisodicBufferConfig};
use crate::{ExperienceBufferBase, ReplayBufferBase, Transition};
use anyhow::Result;

/// A buffer holding the transitions collected since it was last cleared.
///
/// The buffer has no capacity limit: pushes never fail and memory grows with the
/// number of stored transitions. On-policy agents take every stored transition at
/// each optimization step with [`ReplayBufferBase::batch()`], which clears the buffer.
pub struct EpisodicBuffer<O, A> {
    data: Vec<Transition<O, A>>,
}

impl<O, A> EpisodicBuffer<O, A>
where
    O: Clone,
    A: Clone,
{
    /// Returns all stored transitions in insertion order without removing them.
    pub fn gather_all(&self) -> Vec<Transition<O, A>> {
        self.data.clone()
    }

    /// Removes all stored transitions.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Returns an iterator over stored transitions in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Transition<O, A>> {
        self.data.iter()
    }
}

impl<O, A> ExperienceBufferBase for EpisodicBuffer<O, A>
where
    O: Clone,
    A: Clone,
{
    type Item = Transition<O, A>;

    fn len(&self) -> usize {
        self.data.len()
    }

    fn push(&mut self, tr: Self::Item) -> Result<()> {
        self.data.push(tr);
        Ok(())
    }
}

impl<O, A> ReplayBufferBase for EpisodicBuffer<O, A>
where
    O: Clone,
    A: Clone,
{
    type Config = EpisodicBufferConfig;
    type Batch = EpisodeBatch<O, A>;
    const ON_POLICY: bool = true;

    fn build(config: &Self::Config) -> Result<Self> {
        Ok(Self {
            data: Vec::with_capacity(config.capacity_hint),
        })
    }

    /// Takes all stored transitions and clears the buffer. `size` is ignored.
    fn batch(&mut self, _size: usize) -> Result<Self::Batch> {
        let transitions = std::mem::take(&mut self.data);
        Ok(EpisodeBatch { transitions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_episode(buffer: &mut EpisodicBuffer<usize, usize>, start: usize, len: usize) {
        for k in 0..len {
            let tr = Transition {
                observation: start + k,
                action: 0,
                reward: 1.0,
                discount: if k + 1 == len { 0.0 } else { 1.0 },
                is_first: k == 0,
                is_last: k + 1 == len,
            };
            buffer.push(tr).unwrap();
        }
    }

    fn buffer() -> EpisodicBuffer<usize, usize> {
        EpisodicBuffer::build(&EpisodicBufferConfig::default()).unwrap()
    }

    #[test]
    fn test_gather_all_then_clear() {
        let mut buffer = buffer();
        push_episode(&mut buffer, 0, 4);
        push_episode(&mut buffer, 4, 6);

        let all = buffer.gather_all();
        assert_eq!(all.len(), 10);
        let tags: Vec<usize> = all.iter().map(|tr| tr.observation).collect();
        assert_eq!(tags, (0..10).collect::<Vec<_>>());
        assert_eq!(all.iter().filter(|tr| tr.is_last).count(), 2);

        // gather_all() leaves the buffer unchanged
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.gather_all(), all);

        buffer.clear();
        assert!(buffer.gather_all().is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_gather_all_reflects_pushes_since_clear() {
        let mut buffer = buffer();
        push_episode(&mut buffer, 0, 3);
        buffer.clear();
        push_episode(&mut buffer, 100, 2);
        let tags: Vec<usize> = buffer.gather_all().iter().map(|tr| tr.observation).collect();
        assert_eq!(tags, vec![100, 101]);
    }

    #[test]
    fn test_batch_drains_buffer() -> Result<()> {
        let mut buffer = buffer();
        push_episode(&mut buffer, 0, 4);
        push_episode(&mut buffer, 4, 6);
        let batch = buffer.batch(1)?;
        assert_eq!(batch.len(), 10);
        assert_eq!(batch.episodes().count(), 2);
        assert!(buffer.is_empty());
        assert!(buffer.batch(1)?.is_empty());
        Ok(())
    }
}
