use super::{
    RecordMap, RecordStore, delete_in, get_in, lock_map, measurement_in, merge_in, patch_in,
    remove_in, rename_in, sorted,
};
use crate::error::StoreError;
use crate::record::{Measurements, Record, RecordPatch};
use std::sync::Mutex;

/// A store guarded by a single mutex.
#[derive(Debug, Default)]
pub struct CoarseStore {
    records: Mutex<RecordMap>,
}

impl CoarseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for CoarseStore {
    fn upsert(&self, record: Record) {
        tracing::trace!(identifier = %record.identifier, "upsert");
        lock_map(&self.records).insert(record.identifier.clone(), record);
    }

    fn get(&self, identifier: &str) -> Result<Record, StoreError> {
        get_in(&lock_map(&self.records), identifier)
    }

    fn delete(&self, identifier: &str) -> Result<Record, StoreError> {
        delete_in(&mut lock_map(&self.records), identifier)
    }

    fn merge_measurements(
        &self,
        identifier: &str,
        additions: &Measurements,
    ) -> Result<(), StoreError> {
        merge_in(&mut lock_map(&self.records), identifier, additions)
    }

    fn remove_measurements(&self, identifier: &str, labels: &[String]) -> Result<(), StoreError> {
        remove_in(&mut lock_map(&self.records), identifier, labels)
    }

    fn measurement(&self, identifier: &str, label: &str) -> Result<i64, StoreError> {
        measurement_in(&lock_map(&self.records), identifier, label)
    }

    fn patch(&self, identifier: &str, patch: &RecordPatch) -> Result<Record, StoreError> {
        let mut records = lock_map(&self.records);
        match patch.new_identifier().filter(|to| *to != identifier) {
            Some(to) => rename_in(&mut records, None, identifier, to, patch),
            None => patch_in(&mut records, identifier, patch),
        }
    }

    fn len(&self) -> usize {
        lock_map(&self.records).len()
    }

    fn snapshot(&self) -> Vec<Record> {
        sorted(lock_map(&self.records).values().cloned().collect())
    }

    fn clear(&self) {
        lock_map(&self.records).clear();
    }
}
