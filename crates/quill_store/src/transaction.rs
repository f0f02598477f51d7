//! Transactional views over the store.

use crate::executor::{execute_selection_set, ExecutedSelection};
use crate::key_resolver::CacheKeyResolver;
use crate::normalize::normalize_response;
use crate::store::StoreError;
use quill_core::{CacheKey, Record, RecordSet, SelectionSet};
use std::collections::HashSet;

/// A consistent read-only snapshot of the store.
pub struct ReadTransaction<'a> {
    records: &'a RecordSet,
}

impl<'a> ReadTransaction<'a> {
    pub(crate) fn new(records: &'a RecordSet) -> Self {
        Self { records }
    }

    pub fn record(&self, key: &CacheKey) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn execute(
        &self,
        root_key: &CacheKey,
        selection_set: &SelectionSet,
    ) -> Result<ExecutedSelection, StoreError> {
        execute_selection_set(self.records, root_key, selection_set)
    }
}

/// A snapshot with mutable access to records.
///
/// Reads observe earlier writes in the same transaction. Nothing is visible
/// outside the transaction until the body returns, at which point every
/// dirty record publishes atomically.
pub struct ReadWriteTransaction<'a> {
    working: RecordSet,
    dirty: HashSet<CacheKey>,
    resolver: &'a dyn CacheKeyResolver,
}

impl<'a> ReadWriteTransaction<'a> {
    pub(crate) fn new(records: &RecordSet, resolver: &'a dyn CacheKeyResolver) -> Self {
        Self {
            working: records.clone(),
            dirty: HashSet::new(),
            resolver,
        }
    }

    pub fn record(&self, key: &CacheKey) -> Option<&Record> {
        self.working.get(key)
    }

    pub fn execute(
        &self,
        root_key: &CacheKey,
        selection_set: &SelectionSet,
    ) -> Result<ExecutedSelection, StoreError> {
        execute_selection_set(&self.working, root_key, selection_set)
    }

    /// Stages a whole record for publication.
    pub fn write_record(&mut self, record: Record) {
        self.dirty.insert(record.key.clone());
        self.working.insert(record);
    }

    /// Stages every record of `records`.
    pub fn write_records(&mut self, records: RecordSet) {
        for record in records.into_records() {
            self.write_record(record);
        }
    }

    /// The local cache mutation path: executes `selection_set` at
    /// `root_key`, hands the denormalized data to `body` for field writes,
    /// then renormalizes the result and stages the records it touches.
    pub fn update_object(
        &mut self,
        root_key: &CacheKey,
        selection_set: &SelectionSet,
        body: impl FnOnce(&mut quill_core::DataDict),
    ) -> Result<(), StoreError> {
        let executed = self.execute(root_key, selection_set)?;
        let mut dict = executed.data;
        body(&mut dict);
        let records = normalize_response(dict.as_map(), root_key, selection_set, self.resolver);
        self.write_records(records);
        Ok(())
    }

    pub(crate) fn into_pending_writes(self) -> RecordSet {
        let Self { working, dirty, .. } = self;
        let mut pending = RecordSet::new();
        for record in working.into_records() {
            if dirty.contains(&record.key) {
                pending.insert(record);
            }
        }
        pending
    }
}
