//! Pending-work resolution
//!
//! Decides which clusters still have at least one unordered pair of
//! representative entries without a stored alignment result. The core is
//! a pure function over catalog rows so the logic tests without a
//! database.

use crate::store::AlignmentStore;
use crate::types::{GroupMembership, PairKey, RepresentativeEntry};
use anyhow::Result;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

/// Compute cluster ids with pending pairwise work.
///
/// A cluster is pending when it has ≥2 representative entries and at
/// least one of its C(n,2) pairs has no completed alignment group.
/// Groups with other than exactly two distinct member entries can never
/// satisfy a pairwise completeness test and are ignored.
pub fn resolve_pending_clusters(
    reps: &[RepresentativeEntry],
    completed: &[GroupMembership],
) -> Vec<i64> {
    let mut cluster_to_entries: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
    for rep in reps {
        cluster_to_entries
            .entry(rep.cluster_id)
            .or_default()
            .push(rep.entry_id);
    }

    let mut group_to_entries: HashMap<i64, HashSet<i64>> = HashMap::new();
    for membership in completed {
        group_to_entries
            .entry(membership.group_id)
            .or_default()
            .insert(membership.entry_id);
    }

    // Only well-formed binary groups count as completed pairs
    let mut completed_pairs: HashSet<PairKey> = HashSet::new();
    for members in group_to_entries.values() {
        let ids: Vec<i64> = members.iter().copied().collect();
        if let [a, b] = ids[..] {
            completed_pairs.insert(PairKey::new(a, b));
        }
    }

    let mut pending = Vec::new();
    for (cluster_id, entries) in &cluster_to_entries {
        if entries.len() < 2 {
            // Nothing to pair; not an error
            continue;
        }
        let missing = entries
            .iter()
            .enumerate()
            .flat_map(|(i, a)| entries[i + 1..].iter().map(move |b| PairKey::new(*a, *b)))
            .any(|pair| !completed_pairs.contains(&pair));
        if missing {
            pending.push(*cluster_id);
        }
    }

    debug!(
        "Pending resolution: {} of {} clusters still have uncovered pairs",
        pending.len(),
        cluster_to_entries.len()
    );

    pending
}

/// Resolve pending clusters from the persisted catalog state
pub async fn pending_clusters(store: &dyn AlignmentStore) -> Result<Vec<i64>> {
    let reps = store.representative_entries().await?;
    let completed = store.completed_memberships().await?;
    Ok(resolve_pending_clusters(&reps, &completed))
}
