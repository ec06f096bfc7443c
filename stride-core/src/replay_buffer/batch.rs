//! Batches generated by replay buffers.
use crate::Transition;

/// A batch of windows sampled from [`RingReplayBuffer`](super::RingReplayBuffer).
///
/// Each window holds the same number of transitions, contiguous in insertion order.
#[derive(Debug, Clone)]
pub struct WindowBatch<O, A> {
    /// Sampled windows.
    pub windows: Vec<Vec<Transition<O, A>>>,

    /// Logical start index of each window, counted from the oldest stored transition.
    pub ix_sample: Vec<usize>,
}

impl<O, A> WindowBatch<O, A> {
    /// Returns the number of windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Returns `true` if the batch has no window.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Returns the number of transitions in each window.
    pub fn window(&self) -> usize {
        self.windows.first().map_or(0, |w| w.len())
    }

    /// Returns an iterator over the windows.
    pub fn iter(&self) -> std::slice::Iter<'_, Vec<Transition<O, A>>> {
        self.windows.iter()
    }
}

/// All transitions taken from [`EpisodicBuffer`](super::EpisodicBuffer), in insertion order.
#[derive(Debug, Clone)]
pub struct EpisodeBatch<O, A> {
    /// Transitions.
    pub transitions: Vec<Transition<O, A>>,
}

impl<O, A> EpisodeBatch<O, A> {
    /// Returns the number of transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` if the batch has no transition.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Splits the transitions into episodes.
    ///
    /// Each slice ends with a transition having `is_last == true`, except possibly the
    /// final one when the batch ends in the middle of an episode.
    pub fn episodes(&self) -> impl Iterator<Item = &[Transition<O, A>]> {
        self.transitions.split_inclusive(|tr| tr.is_last)
    }
}
