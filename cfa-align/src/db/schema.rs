//! Table initialization for the alignment catalog
//!
//! Creates all catalog tables if they don't exist. The cluster,
//! subcluster, entry and state tables are owned by the upstream
//! pipeline stages; creating them here keeps a fresh database usable
//! for tests and local runs.

use anyhow::Result;
use sqlx::SqlitePool;

/// Initialize catalog tables
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS clusters (
            id INTEGER PRIMARY KEY,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subclusters (
            id INTEGER PRIMARY KEY,
            cluster_id INTEGER NOT NULL REFERENCES clusters(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS states (
            id INTEGER PRIMARY KEY,
            file_path TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subcluster_entries (
            id INTEGER PRIMARY KEY,
            subcluster_id INTEGER NOT NULL REFERENCES subclusters(id),
            state_id INTEGER NOT NULL REFERENCES states(id),
            is_representative INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alignment_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alignment_group_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            alignment_group_id INTEGER NOT NULL REFERENCES alignment_groups(id),
            subcluster_entry_id INTEGER NOT NULL REFERENCES subcluster_entries(id),
            UNIQUE(alignment_group_id, subcluster_entry_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_group_entries_entry
        ON alignment_group_entries(subcluster_entry_id)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alignment_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            alignment_group_id INTEGER NOT NULL UNIQUE REFERENCES alignment_groups(id),
            ce_rms REAL,
            tm_rms REAL,
            tm_seq_id REAL,
            tm_score_chain_1 REAL,
            tm_score_chain_2 REAL,
            fc_rms REAL,
            fc_identity REAL,
            fc_similarity REAL,
            fc_score REAL,
            fc_align_len INTEGER,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (alignment catalog)");

    Ok(())
}
