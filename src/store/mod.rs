//! The keyed record store.
//!
//! [`RecordStore`] is the only way callers touch records: every method is one
//! atomic logical operation, holding exclusive access to the affected data for
//! its whole duration and releasing it on every exit path (guards are dropped
//! on return, including early error returns).
//!
//! Two implementations are provided:
//! - [`CoarseStore`]: one mutex around one map. Simple, and every operation
//!   serializes against every other.
//! - [`ShardedStore`]: identifiers are hashed onto independently locked
//!   shards so merges into different shards proceed in parallel. The default
//!   for ingest.
//!
//! Stores are constructed explicitly and shared by reference (or `Arc`) with
//! the ingest pipeline and any request handlers; there is no global instance.
//!
//! # Example
//! ```
//! use rollcall::record::{Measurements, Record};
//! use rollcall::store::{RecordStore, ShardedStore};
//!
//! let store = ShardedStore::new();
//! store.upsert(Record::new("001"));
//! store.merge_measurements("001", &Measurements::from([("math".to_string(), 95)]))?;
//! assert_eq!(store.measurement("001", "math")?, 95);
//! # Ok::<(), rollcall::error::StoreError>(())
//! ```

mod coarse;
mod sharded;

pub use coarse::CoarseStore;
pub use sharded::{DEFAULT_SHARDS, ShardedStore};

use crate::error::StoreError;
use crate::record::{Measurements, Record, RecordPatch};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub(crate) type RecordMap = HashMap<String, Record>;

/// Atomic operations over identifier-keyed records.
///
/// Implementations must be safe to call from any number of threads at once,
/// including while an ingest run is merging into the same store.
pub trait RecordStore: Send + Sync {
    /// Insert `record`, fully replacing any record with the same identifier.
    fn upsert(&self, record: Record);

    /// A copy of the record stored under `identifier`.
    fn get(&self, identifier: &str) -> Result<Record, StoreError>;

    /// Remove and return the record stored under `identifier`.
    fn delete(&self, identifier: &str) -> Result<Record, StoreError>;

    /// Insert or overwrite each label of `additions`, leaving other labels alone.
    fn merge_measurements(
        &self,
        identifier: &str,
        additions: &Measurements,
    ) -> Result<(), StoreError>;

    /// Remove each label in order.
    ///
    /// Stops at the first label the record does not have and returns
    /// [`StoreError::LabelNotFound`]; labels removed before it in the same
    /// call stay removed.
    fn remove_measurements(&self, identifier: &str, labels: &[String]) -> Result<(), StoreError>;

    /// The score recorded under `label`.
    fn measurement(&self, identifier: &str, label: &str) -> Result<i64, StoreError>;

    /// Apply the fields present in `patch` and return the updated record.
    ///
    /// A new identifier in the patch moves the record to that key within the
    /// same operation. Moving onto a key held by another record fails with
    /// [`StoreError::IdentifierTaken`] and changes nothing.
    fn patch(&self, identifier: &str, patch: &RecordPatch) -> Result<Record, StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A consistent copy of every record, sorted by identifier.
    fn snapshot(&self) -> Vec<Record>;

    fn clear(&self);

    /// Insert a single record submitted by a client.
    ///
    /// Unlike [`upsert`](Self::upsert) this validates the identifier, which
    /// is trimmed before use.
    fn add(&self, mut record: Record) -> Result<(), StoreError> {
        let identifier = record.identifier.trim();
        if identifier.is_empty() {
            return Err(StoreError::MissingIdentifier);
        }
        if identifier.len() != record.identifier.len() {
            record.identifier = identifier.to_string();
        }
        self.upsert(record);
        Ok(())
    }
}

/// Lock a map, recovering from poisoning.
///
/// No operation panics between two writes to the same map, so a poisoned
/// guard still protects a structurally valid map.
pub(crate) fn lock_map(map: &Mutex<RecordMap>) -> MutexGuard<'_, RecordMap> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn get_in(map: &RecordMap, identifier: &str) -> Result<Record, StoreError> {
    map.get(identifier)
        .cloned()
        .ok_or_else(|| StoreError::not_found(identifier))
}

pub(crate) fn delete_in(map: &mut RecordMap, identifier: &str) -> Result<Record, StoreError> {
    map.remove(identifier)
        .ok_or_else(|| StoreError::not_found(identifier))
}

pub(crate) fn merge_in(
    map: &mut RecordMap,
    identifier: &str,
    additions: &Measurements,
) -> Result<(), StoreError> {
    let record = map
        .get_mut(identifier)
        .ok_or_else(|| StoreError::not_found(identifier))?;
    record
        .measurements
        .extend(additions.iter().map(|(k, v)| (k.clone(), *v)));
    Ok(())
}

pub(crate) fn remove_in(
    map: &mut RecordMap,
    identifier: &str,
    labels: &[String],
) -> Result<(), StoreError> {
    let record = map
        .get_mut(identifier)
        .ok_or_else(|| StoreError::not_found(identifier))?;
    for label in labels {
        if record.measurements.remove(label).is_none() {
            return Err(StoreError::LabelNotFound {
                identifier: identifier.to_string(),
                label: label.clone(),
            });
        }
    }
    Ok(())
}

pub(crate) fn measurement_in(
    map: &RecordMap,
    identifier: &str,
    label: &str,
) -> Result<i64, StoreError> {
    let record = map
        .get(identifier)
        .ok_or_else(|| StoreError::not_found(identifier))?;
    record
        .measurements
        .get(label)
        .copied()
        .ok_or_else(|| StoreError::LabelNotFound {
            identifier: identifier.to_string(),
            label: label.to_string(),
        })
}

/// Patch a record in place; the identifier stays the same.
pub(crate) fn patch_in(
    map: &mut RecordMap,
    identifier: &str,
    patch: &RecordPatch,
) -> Result<Record, StoreError> {
    let record = map
        .get_mut(identifier)
        .ok_or_else(|| StoreError::not_found(identifier))?;
    patch.apply_fields(record);
    Ok(record.clone())
}

/// Patch a record and move it from `src[from]` to `dst[to]`.
///
/// `src` and `dst` may be the same map, in which case pass `None` for `dst`.
pub(crate) fn rename_in(
    src: &mut RecordMap,
    dst: Option<&mut RecordMap>,
    from: &str,
    to: &str,
    patch: &RecordPatch,
) -> Result<Record, StoreError> {
    if !src.contains_key(from) {
        return Err(StoreError::not_found(from));
    }
    let taken = match &dst {
        Some(dst) => dst.contains_key(to),
        None => src.contains_key(to),
    };
    if taken {
        return Err(StoreError::IdentifierTaken(to.to_string()));
    }
    let mut record = delete_in(src, from)?;
    patch.apply_fields(&mut record);
    record.identifier = to.to_string();
    let updated = record.clone();
    dst.unwrap_or(src).insert(to.to_string(), record);
    Ok(updated)
}

pub(crate) fn sorted(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by(|a, b| a.identifier.cmp(&b.identifier));
    records
}
