//! Work enqueuing
//!
//! Turns clusters with pending work into one task descriptor per
//! cluster and hands them to the task transport.

use crate::pending::pending_clusters;
use crate::queue::TaskPublisher;
use crate::store::AlignmentStore;
use crate::types::{AlignmentTask, TaskEntry};
use anyhow::Result;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Resolve pending clusters, fetch their representative entries, and
/// publish one task per cluster. Returns the number of published tasks.
///
/// A cluster whose representative count dropped below 2 between
/// resolution and fetch is skipped; zero publishable clusters is a
/// no-op, not an error.
pub async fn enqueue_pending(
    store: &dyn AlignmentStore,
    publisher: &dyn TaskPublisher,
) -> Result<usize> {
    let cluster_ids = pending_clusters(store).await?;
    if cluster_ids.is_empty() {
        info!("No clusters with pending alignments");
        return Ok(0);
    }

    let entries = store.entries_for_clusters(&cluster_ids).await?;

    let mut clusters: BTreeMap<i64, Vec<TaskEntry>> = BTreeMap::new();
    for record in entries {
        clusters.entry(record.cluster_id).or_default().push(TaskEntry {
            entry_id: record.entry_id,
            file_path: record.file_path,
            subcluster_id: record.subcluster_id,
        });
    }

    if !clusters.values().any(|list| list.len() >= 2) {
        warn!("No clusters with pending alignments found. Nothing enqueued.");
        return Ok(0);
    }

    let mut published = 0;
    for (cluster_id, list) in clusters {
        if list.len() < 2 {
            // Raced with an upstream mutation; it will resolve next pass
            continue;
        }

        let count = list.len();
        publisher.publish(AlignmentTask::new(cluster_id, list)).await?;
        info!(
            "Enqueued {} representative entries for cluster {}",
            count, cluster_id
        );
        published += 1;
    }

    Ok(published)
}
