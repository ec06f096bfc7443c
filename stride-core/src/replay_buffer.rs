//! Replay buffers storing [`Transition`](crate::Transition)s.
//!
//! * [`RingReplayBuffer`] is a fixed-capacity ring for off-policy agents. Once it is full,
//!   the oldest transitions are overwritten. Batches are made of windows of contiguous
//!   transitions drawn uniformly at random.
//! * [`EpisodicBuffer`] is a table for on-policy agents. Every batch takes all stored
//!   transitions and clears the buffer.
//! * [`SharedReplayBuffer`] wraps either of them for collectors running on multiple threads.
mod batch;
mod config;
mod episodic;
mod ring;
mod shared;
pub use batch::{EpisodeBatch, WindowBatch};
pub use config::{EpisodicBufferConfig, RingReplayBufferConfig};
pub use episodic::EpisodicBuffer;
pub use ring::RingReplayBuffer;
pub use shared::SharedReplayBuffer;
