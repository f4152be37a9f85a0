//! Uniform CRUD helpers over ordered record lists.
//!
//! # Invariants
//! - Insertion order is preserved; only `list` sorts, and only its output.
//! - Updates and removals of unknown ids change nothing and write nothing.
//! - Identifier uniqueness on `add` is the caller's responsibility;
//!   `insert_new` asks the store for a fresh id instead.

use super::{CollectionRecord, PersistedValue, Record, StoreResult};
use crate::storage::KvStorage;
use chrono::{DateTime, Utc};
use log::debug;
use std::cmp::Ordering;

/// Appends `record` after normalizing it.
pub fn add_record<R: Record>(items: &mut Vec<R>, mut record: R) {
    record.normalize();
    items.push(record);
}

/// Shallow-merges `patch` into the record with `id`.
///
/// Returns `false` and leaves `items` untouched when no record matches.
pub fn update_record<R: Record>(
    items: &mut [R],
    id: &str,
    patch: R::Patch,
    now: DateTime<Utc>,
) -> bool {
    let Some(record) = items.iter_mut().find(|record| record.id() == id) else {
        return false;
    };
    record.apply_patch(patch);
    record.touch(now);
    record.normalize();
    true
}

/// Removes every record with `id`. Returns whether anything was removed.
pub fn remove_record<R: Record>(items: &mut Vec<R>, id: &str) -> bool {
    let len_before = items.len();
    items.retain(|record| record.id() != id);
    items.len() != len_before
}

type Predicate<'q, R> = Box<dyn Fn(&R) -> bool + 'q>;
type Comparator<'q, R> = Box<dyn Fn(&R, &R) -> Ordering + 'q>;

/// Derived-read options: optional filter, optional ordering, optional limit.
pub struct ListQuery<'q, R> {
    filter: Option<Predicate<'q, R>>,
    order: Option<Comparator<'q, R>>,
    limit: Option<usize>,
}

impl<R> Default for ListQuery<'_, R> {
    fn default() -> Self {
        Self {
            filter: None,
            order: None,
            limit: None,
        }
    }
}

impl<'q, R> ListQuery<'q, R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, predicate: impl Fn(&R) -> bool + 'q) -> Self {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Stable sort applied after filtering.
    pub fn sort_by(mut self, comparator: impl Fn(&R, &R) -> Ordering + 'q) -> Self {
        self.order = Some(Box::new(comparator));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Runs the query over `items` without modifying them.
    pub fn run(&self, items: &[R]) -> Vec<R>
    where
        R: Clone,
    {
        let mut selected: Vec<R> = match &self.filter {
            Some(predicate) => items.iter().filter(|item| predicate(item)).cloned().collect(),
            None => items.to_vec(),
        };
        if let Some(comparator) = &self.order {
            selected.sort_by(|a, b| comparator(a, b));
        }
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

/// Top-level collection of `R` backed by one durable key.
pub struct Collection<'s, S: KvStorage, R: CollectionRecord> {
    value: PersistedValue<'s, S, Vec<R>>,
}

impl<'s, S: KvStorage, R: CollectionRecord> Collection<'s, S, R> {
    pub(crate) fn new(value: PersistedValue<'s, S, Vec<R>>) -> Self {
        Self { value }
    }

    /// Records in insertion order.
    pub fn items(&self) -> &[R] {
        self.value.get()
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.items().iter().find(|record| record.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Applies an arbitrary transform through the persisted value.
    pub fn mutate(&mut self, transform: impl FnOnce(Vec<R>) -> Vec<R>) -> StoreResult<&[R]> {
        Ok(self.value.mutate(transform)?.as_slice())
    }

    /// Appends `record` as given; its id is not checked for uniqueness.
    pub fn add(&mut self, record: R) -> StoreResult<()> {
        self.value.mutate(|mut items| {
            add_record(&mut items, record);
            items
        })?;
        Ok(())
    }

    /// Appends several records in one write.
    pub fn extend(&mut self, records: Vec<R>) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.value.mutate(|mut items| {
            for record in records {
                add_record(&mut items, record);
            }
            items
        })?;
        Ok(())
    }

    /// Builds a record around a store-issued id and appends it.
    ///
    /// Returns the issued id.
    pub fn insert_new(&mut self, build: impl FnOnce(String) -> R) -> StoreResult<String> {
        let id = self.issue_id();
        let record = build(id.clone());
        self.add(record)?;
        Ok(id)
    }

    /// Issues an id not used by any record of this collection.
    pub fn issue_id(&self) -> String {
        self.value.store().issue_id(|candidate| self.contains(candidate))
    }

    /// Shallow-merges `patch` into the record with `id`.
    ///
    /// Returns `Ok(false)` without writing when no record matches.
    pub fn update_by_id(&mut self, id: &str, patch: R::Patch) -> StoreResult<bool> {
        if !self.contains(id) {
            debug!(
                "event=collection_update module=store status=noop key={} reason=not_found",
                self.value.key()
            );
            return Ok(false);
        }
        let now = Utc::now();
        self.value.mutate(|mut items| {
            update_record(&mut items, id, patch, now);
            items
        })?;
        Ok(true)
    }

    /// Removes the record with `id`.
    ///
    /// Returns `Ok(false)` without writing when no record matches.
    pub fn remove_by_id(&mut self, id: &str) -> StoreResult<bool> {
        if !self.contains(id) {
            debug!(
                "event=collection_remove module=store status=noop key={} reason=not_found",
                self.value.key()
            );
            return Ok(false);
        }
        self.value.mutate(|mut items| {
            remove_record(&mut items, id);
            items
        })?;
        Ok(true)
    }

    /// Replaces the whole collection.
    pub fn replace_all(&mut self, records: Vec<R>) -> StoreResult<()> {
        self.value.mutate(|_| {
            let mut items = Vec::with_capacity(records.len());
            for record in records {
                add_record(&mut items, record);
            }
            items
        })?;
        Ok(())
    }

    /// Derived read; never mutates.
    pub fn list(&self, query: &ListQuery<'_, R>) -> Vec<R> {
        query.run(self.items())
    }
}
