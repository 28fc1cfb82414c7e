use super::{
    RecordMap, RecordStore, delete_in, get_in, lock_map, measurement_in, merge_in, patch_in,
    remove_in, rename_in, sorted,
};
use crate::error::StoreError;
use crate::record::{Measurements, Record, RecordPatch};
use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;
use std::sync::{Mutex, MutexGuard};

/// Shard count used by [`ShardedStore::new`].
pub const DEFAULT_SHARDS: usize = 16;

/// A store whose identifiers are spread over independently locked shards.
///
/// Single-record operations lock exactly one shard. A rename locks the source
/// and destination shards in ascending index order; whole-store reads
/// (`len`, `snapshot`, `clear`) lock every shard in that same order, so they
/// never observe a rename half-way through and never deadlock with it.
#[derive(Debug)]
pub struct ShardedStore {
    shards: Box<[Mutex<RecordMap>]>,
    hasher: RandomState,
}

impl ShardedStore {
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_SHARDS)
    }

    /// Create a store with `shards` shards (at least one).
    pub fn with_shards(shards: usize) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| Mutex::new(RecordMap::new()))
            .collect();
        Self {
            shards,
            hasher: RandomState::new(),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard_index(&self, identifier: &str) -> usize {
        (self.hasher.hash_one(identifier) % self.shards.len() as u64) as usize
    }

    fn shard(&self, identifier: &str) -> MutexGuard<'_, RecordMap> {
        lock_map(&self.shards[self.shard_index(identifier)])
    }

    fn lock_all(&self) -> Vec<MutexGuard<'_, RecordMap>> {
        self.shards.iter().map(lock_map).collect()
    }
}

impl Default for ShardedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for ShardedStore {
    fn upsert(&self, record: Record) {
        tracing::trace!(identifier = %record.identifier, "upsert");
        self.shard(&record.identifier)
            .insert(record.identifier.clone(), record);
    }

    fn get(&self, identifier: &str) -> Result<Record, StoreError> {
        get_in(&self.shard(identifier), identifier)
    }

    fn delete(&self, identifier: &str) -> Result<Record, StoreError> {
        delete_in(&mut self.shard(identifier), identifier)
    }

    fn merge_measurements(
        &self,
        identifier: &str,
        additions: &Measurements,
    ) -> Result<(), StoreError> {
        merge_in(&mut self.shard(identifier), identifier, additions)
    }

    fn remove_measurements(&self, identifier: &str, labels: &[String]) -> Result<(), StoreError> {
        remove_in(&mut self.shard(identifier), identifier, labels)
    }

    fn measurement(&self, identifier: &str, label: &str) -> Result<i64, StoreError> {
        measurement_in(&self.shard(identifier), identifier, label)
    }

    fn patch(&self, identifier: &str, patch: &RecordPatch) -> Result<Record, StoreError> {
        let Some(to) = patch.new_identifier().filter(|to| *to != identifier) else {
            return patch_in(&mut self.shard(identifier), identifier, patch);
        };

        let (from_idx, to_idx) = (self.shard_index(identifier), self.shard_index(to));
        if from_idx == to_idx {
            let mut shard = lock_map(&self.shards[from_idx]);
            return rename_in(&mut shard, None, identifier, to, patch);
        }

        let (low, high) = (from_idx.min(to_idx), from_idx.max(to_idx));
        let mut low_guard = lock_map(&self.shards[low]);
        let mut high_guard = lock_map(&self.shards[high]);
        let (src, dst) = if from_idx == low {
            (&mut *low_guard, &mut *high_guard)
        } else {
            (&mut *high_guard, &mut *low_guard)
        };
        rename_in(src, Some(dst), identifier, to, patch)
    }

    fn len(&self) -> usize {
        self.lock_all().iter().map(|shard| shard.len()).sum()
    }

    fn snapshot(&self) -> Vec<Record> {
        let guards = self.lock_all();
        sorted(
            guards
                .iter()
                .flat_map(|shard| shard.values().cloned())
                .collect(),
        )
    }

    fn clear(&self) {
        for mut shard in self.lock_all() {
            shard.clear();
        }
    }
}
