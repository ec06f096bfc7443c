#![warn(missing_docs)]
//! Tabular agents and a toy environment built on [`stride_core`].
//!
//! * [`corridor::Corridor`] is a one-dimensional walk with a goal at the right end.
//! * [`tabular::QLearningAgent`] is an off-policy agent trained with a
//!   [`RingReplayBuffer`](stride_core::replay_buffer::RingReplayBuffer).
//! * [`tabular::MonteCarloAgent`] is an on-policy agent trained with an
//!   [`EpisodicBuffer`](stride_core::replay_buffer::EpisodicBuffer).
//! * [`CsvRecorder`] writes flushed metrics into a CSV file for plotting.
pub mod corridor;
pub mod tabular;

mod csv_recorder;
pub use csv_recorder::CsvRecorder;
