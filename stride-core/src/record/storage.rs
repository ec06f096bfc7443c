//! Record storage and aggregation.
use super::{Record, RecordValue};
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

/// Stores records and aggregates them into a single record.
///
/// Scalars under the same key are summarized with min, max, mean and median, or kept
/// as they are if only one value was stored. For other types of values, the most
/// recent one is kept. A key holding values of different types keeps the most recent
/// value.
#[derive(Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().copied().fold(f32::INFINITY, f32::min))
}

fn max(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().copied().fold(f32::NEG_INFINITY, f32::max))
}

fn mean(vs: &[f32]) -> RecordValue {
    RecordValue::Scalar(vs.iter().sum::<f32>() / vs.len() as f32)
}

fn median(mut vs: Vec<f32>) -> RecordValue {
    vs.sort_by(|x, y| x.total_cmp(y));
    RecordValue::Scalar(vs[vs.len() / 2])
}

impl RecordStorage {
    /// Creates a new empty record storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    /// Returns `true` if no record is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn get_keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
        }
        keys
    }

    fn latest(&self, key: &str) -> Option<&RecordValue> {
        self.data.iter().rev().find_map(|record| record.get(key))
    }

    fn scalars(&self, key: &str) -> Option<Vec<f32>> {
        self.data
            .iter()
            .filter_map(|record| record.get(key))
            .map(|v| match v {
                RecordValue::Scalar(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    fn aggregate_key(&self, key: &str) -> Record {
        match self.scalars(key) {
            Some(vs) if vs.len() == 1 => Record::from_scalar(key, vs[0]),
            Some(vs) => Record::from_slice(&[
                (format!("{}_min", key), min(&vs)),
                (format!("{}_max", key), max(&vs)),
                (format!("{}_mean", key), mean(&vs)),
                (format!("{}_median", key), median(vs)),
            ]),
            None => match self.latest(key) {
                Some(v) => Record::from_slice(&[(key, v.clone())]),
                None => Record::empty(),
            },
        }
    }

    /// Aggregates all stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();
        for key in self.get_keys().iter() {
            record.merge_inplace(self.aggregate_key(key));
        }
        self.data.clear();
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate() {
        let mut storage = RecordStorage::new();
        for (i, loss) in [4.0, 1.0, 3.0].iter().enumerate() {
            let mut record = Record::from_scalar("loss", *loss);
            record.insert("phase", RecordValue::String(format!("train{}", i)));
            storage.store(record);
        }
        storage.store(Record::from_scalar("average_return", 10.0));

        let record = storage.aggregate();
        assert_eq!(record.get_scalar("loss_min").unwrap(), 1.0);
        assert_eq!(record.get_scalar("loss_max").unwrap(), 4.0);
        assert!((record.get_scalar("loss_mean").unwrap() - 8.0 / 3.0).abs() < 1e-6);
        assert_eq!(record.get_scalar("loss_median").unwrap(), 3.0);
        assert_eq!(record.get_scalar("average_return").unwrap(), 10.0);
        assert_eq!(record.get_string("phase").unwrap(), "train2");
        assert!(storage.is_empty());
        assert!(storage.aggregate().is_empty());
    }
}
