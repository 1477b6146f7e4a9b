//! Database access for cfa-align
//!
//! SQLite-backed implementation of the [`AlignmentStore`] port.

pub mod alignments;
pub mod catalog;
pub mod schema;

use crate::store::AlignmentStore;
use crate::types::{
    EntryRecord, GroupMembership, MergedAlignment, RepresentativeEntry, StoreOutcome,
};
use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Connects to the catalog database, creating it (and its parent
/// directory) if missing, and initializes the tables.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    schema::init_tables(&pool).await?;

    Ok(pool)
}

/// SQLite-backed [`AlignmentStore`]
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl AlignmentStore for SqliteStore {
    async fn representative_entries(&self) -> Result<Vec<RepresentativeEntry>> {
        catalog::representative_entries(&self.pool).await
    }

    async fn completed_memberships(&self) -> Result<Vec<GroupMembership>> {
        catalog::completed_memberships(&self.pool).await
    }

    async fn entries_for_clusters(&self, cluster_ids: &[i64]) -> Result<Vec<EntryRecord>> {
        catalog::entries_for_clusters(&self.pool, cluster_ids).await
    }

    async fn persist_results(
        &self,
        cluster_id: i64,
        records: &[MergedAlignment],
    ) -> Result<StoreOutcome> {
        alignments::persist_results(&self.pool, cluster_id, records).await
    }
}
