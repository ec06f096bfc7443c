use anyhow::Result;
use csv::{Writer, WriterBuilder};
use log::warn;
use serde::Serialize;
use std::{fs::File, path::Path};
use stride_core::record::{AggregateRecorder, Record, RecordStorage, RecordValue, Recorder};

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    step: i64,
    key: &'a str,
    value: f32,
}

/// Writes scalar metrics into a CSV file with columns `step,key,value`.
///
/// Records given with [`AggregateRecorder::store`] are aggregated on
/// [`AggregateRecorder::flush`]. Records given with [`Recorder::write`] must have a
/// `"step"` entry. Values other than scalars are ignored.
pub struct CsvRecorder {
    wtr: Writer<File>,
    storage: RecordStorage,
}

impl CsvRecorder {
    /// Creates the file at `path` and writes the header.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let wtr = WriterBuilder::new()
            .has_headers(true)
            .from_writer(File::create(path)?);
        Ok(Self {
            wtr,
            storage: RecordStorage::new(),
        })
    }

    fn write_rows(&mut self, step: i64, record: &Record) -> Result<()> {
        let mut rows = record
            .iter()
            .filter_map(|(key, value)| match value {
                RecordValue::Scalar(value) if key != "step" => Some(CsvRow {
                    step,
                    key,
                    value: *value,
                }),
                _ => None,
            })
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| a.key.cmp(b.key));

        for row in rows {
            self.wtr.serialize(row)?;
        }
        self.wtr.flush()?;
        Ok(())
    }
}

impl Recorder for CsvRecorder {
    fn write(&mut self, record: Record) {
        let result = record
            .get_scalar("step")
            .map_err(anyhow::Error::from)
            .and_then(|step| self.write_rows(step as i64, &record));
        if let Err(e) = result {
            warn!("Failed to write a record: {}", e);
        }
    }
}

impl AggregateRecorder for CsvRecorder {
    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        if self.storage.is_empty() {
            return;
        }
        let record = self.storage.aggregate();
        if let Err(e) = self.write_rows(step, &record) {
            warn!("Failed to write records at step {}: {}", step, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    #[test]
    fn test_csv_recorder() -> Result<()> {
        let dir = TempDir::new("csv_recorder")?;
        let path = dir.path().join("metrics.csv");
        let mut recorder = CsvRecorder::new(&path)?;

        recorder.store(Record::from_scalar("loss", 0.5));
        recorder.store(Record::from_slice(&[
            ("average_return", RecordValue::Scalar(1.0)),
            ("note", RecordValue::String("ignored".into())),
        ]));
        recorder.flush(10);
        recorder.flush(11);
        recorder.write(Record::from_slice(&[
            ("step", RecordValue::Scalar(12.0)),
            ("loss", RecordValue::Scalar(0.25)),
        ]));

        let text = fs::read_to_string(&path)?;
        assert_eq!(
            text,
            "step,key,value\n10,average_return,1.0\n10,loss,0.5\n12,loss,0.25\n"
        );
        Ok(())
    }
}
