use super::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};

/// Keeps records in memory.
///
/// Records given with [`Recorder::write`] are kept as they are. Records given with
/// [`AggregateRecorder::store`] are aggregated on [`AggregateRecorder::flush`] and the
/// aggregated record, with key `"step"` added, is kept as well. This recorder is useful
/// for plotting metrics after training and in tests.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    storage: RecordStorage,
}

impl BufferedRecorder {
    /// Construct the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the records.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.buf.iter()
    }

    /// Returns the number of kept records.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if no record is kept.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns `(step, value)` pairs of a scalar in the kept records.
    ///
    /// Records without the key or without `"step"` are skipped.
    pub fn scalar_series(&self, key: &str) -> Vec<(i64, f32)> {
        self.buf
            .iter()
            .filter_map(|r| match (r.get_scalar("step"), r.get_scalar(key)) {
                (Ok(step), Ok(v)) => Some((step as i64, v)),
                _ => None,
            })
            .collect()
    }
}

impl Recorder for BufferedRecorder {
    /// Write a [`Record`] to the buffer.
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }
}

impl AggregateRecorder for BufferedRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        if self.storage.is_empty() {
            return;
        }
        let mut record = self.storage.aggregate();
        record.insert("step", RecordValue::Scalar(step as f32));
        self.buf.push(record);
    }
}
