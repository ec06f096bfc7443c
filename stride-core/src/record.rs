//! Records of training metrics and recorders consuming them.
//!
//! A [`Record`] is a set of named values. [`Trainer`](crate::Trainer) produces one
//! record per iteration, holding the loss, collection statistics and evaluation results,
//! and passes it to an [`AggregateRecorder`], which aggregates stored records when flushed.
//!
//! ```rust
//! use stride_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("train_step", RecordValue::Scalar(1.0));
//! record.insert("loss", RecordValue::Scalar(0.25));
//! record.insert("episode_returns", RecordValue::Array1(vec![1.0, 0.0]));
//! assert_eq!(record.get_scalar("loss").unwrap(), 0.25);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::{AggregateRecorder, Recorder};
pub use storage::RecordStorage;
