//! Catalog read queries
//!
//! Read-only view over the upstream-owned cluster tables and the
//! already-completed alignment groups.

use crate::types::{EntryRecord, GroupMembership, RepresentativeEntry};
use anyhow::Result;
use sqlx::{Row, SqlitePool};

/// All representative subcluster entries with their cluster ids
pub async fn representative_entries(pool: &SqlitePool) -> Result<Vec<RepresentativeEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT e.id AS entry_id, e.subcluster_id, s.cluster_id
        FROM subcluster_entries e
        JOIN subclusters s ON s.id = e.subcluster_id
        WHERE e.is_representative = 1
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| RepresentativeEntry {
            entry_id: row.get("entry_id"),
            subcluster_id: row.get("subcluster_id"),
            cluster_id: row.get("cluster_id"),
        })
        .collect())
}

/// Membership edges of groups that already carry a stored result
pub async fn completed_memberships(pool: &SqlitePool) -> Result<Vec<GroupMembership>> {
    let rows = sqlx::query(
        r#"
        SELECT ge.alignment_group_id AS group_id, ge.subcluster_entry_id AS entry_id
        FROM alignment_group_entries ge
        JOIN alignment_results r ON r.alignment_group_id = ge.alignment_group_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| GroupMembership {
            group_id: row.get("group_id"),
            entry_id: row.get("entry_id"),
        })
        .collect())
}

/// Representative entries with conformer file paths for the given clusters
pub async fn entries_for_clusters(
    pool: &SqlitePool,
    cluster_ids: &[i64],
) -> Result<Vec<EntryRecord>> {
    if cluster_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; cluster_ids.len()].join(", ");
    let query = format!(
        r#"
        SELECT e.id AS entry_id, st.file_path, e.subcluster_id, s.cluster_id
        FROM subcluster_entries e
        JOIN subclusters s ON s.id = e.subcluster_id
        JOIN states st ON st.id = e.state_id
        WHERE e.is_representative = 1 AND s.cluster_id IN ({})
        ORDER BY s.cluster_id, e.id
        "#,
        placeholders
    );

    let mut q = sqlx::query(&query);
    for cluster_id in cluster_ids {
        q = q.bind(cluster_id);
    }

    let rows = q.fetch_all(pool).await?;

    Ok(rows
        .iter()
        .map(|row| EntryRecord {
            entry_id: row.get("entry_id"),
            file_path: row.get("file_path"),
            subcluster_id: row.get("subcluster_id"),
            cluster_id: row.get("cluster_id"),
        })
        .collect())
}
