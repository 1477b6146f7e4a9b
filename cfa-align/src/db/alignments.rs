//! Idempotent persistence of merged alignment records
//!
//! One transaction per cluster batch. Each record resolves its two
//! member entries, finds or creates the alignment group for the pair,
//! and inserts a result only if the group has none yet. An existing
//! result is never overwritten. Any unexpected failure rolls back the
//! whole batch; the next pending-work pass retries it safely.

use crate::types::{MergedAlignment, StoreOutcome};
use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, error, info};

/// Persist one cluster's merged records in a single transaction
pub async fn persist_results(
    pool: &SqlitePool,
    cluster_id: i64,
    records: &[MergedAlignment],
) -> Result<StoreOutcome> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut outcome = StoreOutcome::default();

    for record in records {
        let (entry_1, entry_2) = (record.entry_1_id, record.entry_2_id);

        // Resolve both member entries
        if !entries_exist(&mut tx, entry_1, entry_2).await? {
            error!(
                "Could not find subcluster entries {} or {}. Skipping.",
                entry_1, entry_2
            );
            outcome.skipped_missing += 1;
            continue;
        }

        // Find or create the group for this pair
        let group_id = match find_group_for_pair(&mut tx, entry_1, entry_2).await? {
            Some(id) => {
                outcome.reused_groups += 1;
                id
            }
            None => create_group(&mut tx, entry_1, entry_2).await?,
        };

        // An existing result is never overwritten
        if result_exists(&mut tx, group_id).await? {
            info!(
                "Alignment result already exists for group {}. Skipping.",
                group_id
            );
            outcome.skipped_existing += 1;
            continue;
        }

        insert_result(&mut tx, group_id, record).await?;
        outcome.inserted += 1;
    }

    tx.commit()
        .await
        .with_context(|| format!("Failed to commit alignment results for cluster {}", cluster_id))?;

    info!(
        "Stored {} new alignment results for cluster {} ({} already present, {} skipped)",
        outcome.inserted, cluster_id, outcome.skipped_existing, outcome.skipped_missing
    );

    Ok(outcome)
}

async fn entries_exist(conn: &mut SqliteConnection, entry_1: i64, entry_2: i64) -> Result<bool> {
    let found: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT id) FROM subcluster_entries WHERE id IN (?, ?)",
    )
    .bind(entry_1)
    .bind(entry_2)
    .fetch_one(conn)
    .await?;

    Ok(found == 2)
}

/// Look up the group whose membership is exactly the two entries
async fn find_group_for_pair(
    conn: &mut SqliteConnection,
    entry_1: i64,
    entry_2: i64,
) -> Result<Option<i64>> {
    let group_id: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT ge.alignment_group_id
        FROM alignment_group_entries ge
        WHERE ge.subcluster_entry_id IN (?, ?)
        GROUP BY ge.alignment_group_id
        HAVING COUNT(DISTINCT ge.subcluster_entry_id) = 2
           AND (SELECT COUNT(*) FROM alignment_group_entries x
                WHERE x.alignment_group_id = ge.alignment_group_id) = 2
        LIMIT 1
        "#,
    )
    .bind(entry_1)
    .bind(entry_2)
    .fetch_optional(conn)
    .await?;

    Ok(group_id)
}

/// Create a group and its two membership rows
async fn create_group(conn: &mut SqliteConnection, entry_1: i64, entry_2: i64) -> Result<i64> {
    let group_id = sqlx::query("INSERT INTO alignment_groups (created_at) VALUES (CURRENT_TIMESTAMP)")
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

    for entry_id in [entry_1, entry_2] {
        sqlx::query(
            "INSERT INTO alignment_group_entries (alignment_group_id, subcluster_entry_id) \
             VALUES (?, ?)",
        )
        .bind(group_id)
        .bind(entry_id)
        .execute(&mut *conn)
        .await?;
    }

    debug!(
        "Created alignment group {} for entries ({}, {})",
        group_id, entry_1, entry_2
    );

    Ok(group_id)
}

async fn result_exists(conn: &mut SqliteConnection, group_id: i64) -> Result<bool> {
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT id FROM alignment_results WHERE alignment_group_id = ?")
            .bind(group_id)
            .fetch_optional(conn)
            .await?;

    Ok(existing.is_some())
}

async fn insert_result(
    conn: &mut SqliteConnection,
    group_id: i64,
    record: &MergedAlignment,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO alignment_results (
            alignment_group_id,
            ce_rms,
            tm_rms, tm_seq_id, tm_score_chain_1, tm_score_chain_2,
            fc_rms, fc_identity, fc_similarity, fc_score, fc_align_len,
            created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(group_id)
    .bind(record.ce_rms)
    .bind(record.tm_rms)
    .bind(record.tm_seq_id)
    .bind(record.tm_score_chain_1)
    .bind(record.tm_score_chain_2)
    .bind(record.fc_rms)
    .bind(record.fc_identity)
    .bind(record.fc_similarity)
    .bind(record.fc_score)
    .bind(record.fc_align_len)
    .execute(conn)
    .await?;

    Ok(())
}
