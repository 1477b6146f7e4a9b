//! Persistence port for the alignment scheduler
//!
//! Every scheduling stage receives an [`AlignmentStore`] rather than a
//! database handle, so the whole pipeline runs unchanged against SQLite
//! ([`crate::db::SqliteStore`]) or against the in-memory
//! [`MemoryStore`] used by tests and dry runs.

use crate::types::{
    EntryRecord, GroupMembership, MergedAlignment, PairKey, RepresentativeEntry, StoreOutcome,
};
use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::warn;

/// Read/write access to the pair catalog.
///
/// Contract for `persist_results`: the whole batch is atomic; an
/// existing result for a pair's group is never overwritten; a missing
/// entry skips only that record.
#[async_trait::async_trait]
pub trait AlignmentStore: Send + Sync {
    /// All representative subcluster entries with their cluster ids
    async fn representative_entries(&self) -> Result<Vec<RepresentativeEntry>>;

    /// Membership edges of every alignment group that already has a
    /// stored result
    async fn completed_memberships(&self) -> Result<Vec<GroupMembership>>;

    /// Representative entries (with file paths) for the given clusters
    async fn entries_for_clusters(&self, cluster_ids: &[i64]) -> Result<Vec<EntryRecord>>;

    /// Persist one cluster's merged records, idempotently
    async fn persist_results(
        &self,
        cluster_id: i64,
        records: &[MergedAlignment],
    ) -> Result<StoreOutcome>;
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Clone)]
struct SeedEntry {
    entry_id: i64,
    subcluster_id: i64,
    cluster_id: i64,
    file_path: String,
    is_representative: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: Vec<SeedEntry>,
    groups: BTreeMap<i64, PairKey>,
    results: BTreeMap<i64, MergedAlignment>,
    next_group_id: i64,
    result_inserts: usize,
    group_inserts: usize,
}

/// In-memory [`AlignmentStore`] with insert counters.
///
/// Mirrors the idempotency contract of the SQLite store. The counters
/// let callers assert that a repeated persist is a true no-op.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one catalog entry (upstream normally owns these rows)
    pub fn seed_entry(
        &self,
        entry_id: i64,
        subcluster_id: i64,
        cluster_id: i64,
        file_path: &str,
        is_representative: bool,
    ) {
        let mut state = self.state.lock().unwrap();
        state.entries.push(SeedEntry {
            entry_id,
            subcluster_id,
            cluster_id,
            file_path: file_path.to_string(),
            is_representative,
        });
    }

    /// Total alignment-result insertions performed so far
    pub fn result_inserts(&self) -> usize {
        self.state.lock().unwrap().result_inserts
    }

    /// Total alignment-group insertions performed so far
    pub fn group_inserts(&self) -> usize {
        self.state.lock().unwrap().group_inserts
    }

    pub fn group_count(&self) -> usize {
        self.state.lock().unwrap().groups.len()
    }

    pub fn result_count(&self) -> usize {
        self.state.lock().unwrap().results.len()
    }

    /// The stored result for a pair, if any
    pub fn result_for_pair(&self, a: i64, b: i64) -> Option<MergedAlignment> {
        let key = PairKey::new(a, b);
        let state = self.state.lock().unwrap();
        let group_id = state
            .groups
            .iter()
            .find(|(_, pair)| **pair == key)
            .map(|(id, _)| *id)?;
        state.results.get(&group_id).cloned()
    }
}

#[async_trait::async_trait]
impl AlignmentStore for MemoryStore {
    async fn representative_entries(&self) -> Result<Vec<RepresentativeEntry>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .entries
            .iter()
            .filter(|e| e.is_representative)
            .map(|e| RepresentativeEntry {
                entry_id: e.entry_id,
                subcluster_id: e.subcluster_id,
                cluster_id: e.cluster_id,
            })
            .collect())
    }

    async fn completed_memberships(&self) -> Result<Vec<GroupMembership>> {
        let state = self.state.lock().unwrap();
        let mut memberships = Vec::new();
        for (group_id, pair) in &state.groups {
            if state.results.contains_key(group_id) {
                memberships.push(GroupMembership {
                    group_id: *group_id,
                    entry_id: pair.lo,
                });
                memberships.push(GroupMembership {
                    group_id: *group_id,
                    entry_id: pair.hi,
                });
            }
        }
        Ok(memberships)
    }

    async fn entries_for_clusters(&self, cluster_ids: &[i64]) -> Result<Vec<EntryRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .entries
            .iter()
            .filter(|e| e.is_representative && cluster_ids.contains(&e.cluster_id))
            .map(|e| EntryRecord {
                entry_id: e.entry_id,
                file_path: e.file_path.clone(),
                subcluster_id: e.subcluster_id,
                cluster_id: e.cluster_id,
            })
            .collect())
    }

    async fn persist_results(
        &self,
        _cluster_id: i64,
        records: &[MergedAlignment],
    ) -> Result<StoreOutcome> {
        let mut state = self.state.lock().unwrap();
        let mut outcome = StoreOutcome::default();

        for record in records {
            let known = |id: i64| state.entries.iter().any(|e| e.entry_id == id);
            if !known(record.entry_1_id) || !known(record.entry_2_id) {
                warn!(
                    "Could not find subcluster entries {} or {}. Skipping.",
                    record.entry_1_id, record.entry_2_id
                );
                outcome.skipped_missing += 1;
                continue;
            }

            let key = record.pair_key();
            let existing = state
                .groups
                .iter()
                .find(|(_, pair)| **pair == key)
                .map(|(id, _)| *id);

            let group_id = match existing {
                Some(id) => {
                    outcome.reused_groups += 1;
                    id
                }
                None => {
                    state.next_group_id += 1;
                    let id = state.next_group_id;
                    state.groups.insert(id, key);
                    state.group_inserts += 1;
                    id
                }
            };

            if state.results.contains_key(&group_id) {
                outcome.skipped_existing += 1;
                continue;
            }

            state.results.insert(group_id, record.clone());
            state.result_inserts += 1;
            outcome.inserted += 1;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merged(cluster_id: i64, a: i64, b: i64, ce_rms: f64) -> MergedAlignment {
        let mut record = MergedAlignment::new(cluster_id, a, b);
        record.ce_rms = Some(ce_rms);
        record
    }

    #[tokio::test]
    async fn test_persist_is_idempotent() {
        let store = MemoryStore::new();
        store.seed_entry(1, 1, 1, "/data/1.cif", true);
        store.seed_entry(2, 2, 1, "/data/2.cif", true);

        let batch = vec![merged(1, 1, 2, 1.5)];

        let first = store.persist_results(1, &batch).await.unwrap();
        assert_eq!(first.inserted, 1);
        assert_eq!(store.result_inserts(), 1);

        // Second pass must not touch the persistence layer again
        let second = store.persist_results(1, &batch).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped_existing, 1);
        assert_eq!(store.result_inserts(), 1);
        assert_eq!(store.group_inserts(), 1);
    }

    #[tokio::test]
    async fn test_existing_result_is_never_overwritten() {
        let store = MemoryStore::new();
        store.seed_entry(1, 1, 1, "/data/1.cif", true);
        store.seed_entry(2, 2, 1, "/data/2.cif", true);

        store.persist_results(1, &[merged(1, 1, 2, 1.5)]).await.unwrap();
        // Same pair in reversed order with different values
        store.persist_results(1, &[merged(1, 2, 1, 9.9)]).await.unwrap();

        let stored = store.result_for_pair(1, 2).unwrap();
        assert_eq!(stored.ce_rms, Some(1.5));
        assert_eq!(store.result_count(), 1);
        assert_eq!(store.group_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_entry_skips_record_only() {
        let store = MemoryStore::new();
        store.seed_entry(1, 1, 1, "/data/1.cif", true);
        store.seed_entry(2, 2, 1, "/data/2.cif", true);

        let batch = vec![merged(1, 1, 99, 0.4), merged(1, 1, 2, 1.1)];
        let outcome = store.persist_results(1, &batch).await.unwrap();

        assert_eq!(outcome.skipped_missing, 1);
        assert_eq!(outcome.inserted, 1);
        assert!(store.result_for_pair(1, 2).is_some());
    }
}
