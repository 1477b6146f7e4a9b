//! End-to-end scheduler tests over the SQLite store
//!
//! Drives the resolve → enqueue → align → merge → store pipeline with
//! stub comparison backends against an in-memory database.

use cfa_align::db::{schema::init_tables, SqliteStore};
use cfa_align::enqueue::enqueue_pending;
use cfa_align::pending::pending_clusters;
use cfa_align::queue::{self, TaskConsumer};
use cfa_align::types::{
    AlignError, AlignmentKind, AlignmentTask, MetricMap, StructureAligner, TaskEntry,
};
use cfa_align::{AlignerRegistry, AlignmentPipeline, AlignmentStore};
use sqlx::SqlitePool;
use std::sync::Arc;

// ============================================================================
// Fixtures
// ============================================================================

async fn test_store() -> SqliteStore {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    init_tables(&pool).await.unwrap();
    SqliteStore::new(pool)
}

async fn seed_entry(
    pool: &SqlitePool,
    entry_id: i64,
    subcluster_id: i64,
    cluster_id: i64,
    is_representative: bool,
) {
    sqlx::query("INSERT OR IGNORE INTO clusters (id) VALUES (?)")
        .bind(cluster_id)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT OR IGNORE INTO subclusters (id, cluster_id) VALUES (?, ?)")
        .bind(subcluster_id)
        .bind(cluster_id)
        .execute(pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO states (id, file_path) VALUES (?, ?)")
        .bind(entry_id)
        .bind(format!("/data/states/{}.cif", entry_id))
        .execute(pool)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO subcluster_entries (id, subcluster_id, state_id, is_representative) \
         VALUES (?, ?, ?, ?)",
    )
    .bind(entry_id)
    .bind(subcluster_id)
    .bind(entry_id)
    .bind(is_representative as i64)
    .execute(pool)
    .await
    .unwrap();
}

async fn count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

/// CE stub returning a fixed metric
struct StubCe;

#[async_trait::async_trait]
impl StructureAligner for StubCe {
    fn kind(&self) -> AlignmentKind {
        AlignmentKind::CombinatorialExtension
    }

    fn name(&self) -> &'static str {
        "stub-ce"
    }

    async fn align(&self, _a: &str, _b: &str) -> Result<MetricMap, AlignError> {
        let mut metrics = MetricMap::new();
        metrics.insert("ce_rms".to_string(), 1.2);
        Ok(metrics)
    }
}

/// TM stub that fails whenever a given path is involved
struct StubTm {
    fail_on: Option<&'static str>,
}

#[async_trait::async_trait]
impl StructureAligner for StubTm {
    fn kind(&self) -> AlignmentKind {
        AlignmentKind::TmAlign
    }

    fn name(&self) -> &'static str {
        "stub-tm"
    }

    async fn align(&self, a: &str, b: &str) -> Result<MetricMap, AlignError> {
        if let Some(needle) = self.fail_on {
            if a.contains(needle) || b.contains(needle) {
                return Err(AlignError::Unavailable("stub failure".to_string()));
            }
        }
        let mut metrics = MetricMap::new();
        metrics.insert("tm_rms".to_string(), 0.8);
        metrics.insert("tm_seq_id".to_string(), 0.5);
        metrics.insert("tm_score_chain_1".to_string(), 0.9);
        metrics.insert("tm_score_chain_2".to_string(), 0.95);
        Ok(metrics)
    }
}

fn pipeline(aligners: Vec<Arc<dyn StructureAligner>>) -> AlignmentPipeline {
    AlignmentPipeline::new(AlignerRegistry::with_aligners(aligners))
}

/// Resolve, enqueue and process every pending cluster once
async fn full_pass(store: &SqliteStore, pipeline: &AlignmentPipeline) -> usize {
    let (publisher, mut consumer) = queue::channel();
    let enqueued = enqueue_pending(store, &publisher).await.unwrap();
    drop(publisher);

    while let Some(task) = consumer.next_task().await {
        pipeline.run_task(store, &task).await.unwrap();
    }

    enqueued
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_full_pass_covers_all_pairs() {
    let store = test_store().await;
    for (entry_id, subcluster_id) in [(1i64, 10i64), (2, 11), (3, 12)] {
        seed_entry(store.pool(), entry_id, subcluster_id, 1, true).await;
    }

    assert_eq!(pending_clusters(&store).await.unwrap(), vec![1]);

    let pipeline = pipeline(vec![Arc::new(StubCe), Arc::new(StubTm { fail_on: None })]);
    let enqueued = full_pass(&store, &pipeline).await;
    assert_eq!(enqueued, 1);

    // C(3,2) = 3 pairs, each with one group and one merged result
    assert_eq!(count(store.pool(), "alignment_groups").await, 3);
    assert_eq!(count(store.pool(), "alignment_group_entries").await, 6);
    assert_eq!(count(store.pool(), "alignment_results").await, 3);

    // Both backends' fields landed in each record
    let sparse: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM alignment_results WHERE ce_rms IS NULL OR tm_rms IS NULL",
    )
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(sparse, 0);

    // Nothing left pending
    assert!(pending_clusters(&store).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_second_pass_is_a_noop() {
    let store = test_store().await;
    seed_entry(store.pool(), 1, 10, 1, true).await;
    seed_entry(store.pool(), 2, 11, 1, true).await;

    let pipeline = pipeline(vec![Arc::new(StubCe)]);
    assert_eq!(full_pass(&store, &pipeline).await, 1);
    assert_eq!(full_pass(&store, &pipeline).await, 0);

    assert_eq!(count(store.pool(), "alignment_groups").await, 1);
    assert_eq!(count(store.pool(), "alignment_results").await, 1);
}

#[tokio::test]
async fn test_replayed_task_creates_no_duplicates() {
    let store = test_store().await;
    seed_entry(store.pool(), 1, 10, 1, true).await;
    seed_entry(store.pool(), 2, 11, 1, true).await;

    let task = AlignmentTask::new(
        1,
        vec![
            TaskEntry {
                entry_id: 1,
                file_path: "/data/states/1.cif".to_string(),
                subcluster_id: 10,
            },
            TaskEntry {
                entry_id: 2,
                file_path: "/data/states/2.cif".to_string(),
                subcluster_id: 11,
            },
        ],
    );

    let pipeline = pipeline(vec![Arc::new(StubCe)]);

    let first = pipeline.run_task(&store, &task).await.unwrap();
    assert_eq!(first.inserted, 1);

    // A redelivered task (e.g. after a crash between store and ack)
    let second = pipeline.run_task(&store, &task).await.unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped_existing, 1);

    assert_eq!(count(store.pool(), "alignment_groups").await, 1);
    assert_eq!(count(store.pool(), "alignment_results").await, 1);
}

#[tokio::test]
async fn test_partially_covered_cluster_resumes() {
    let store = test_store().await;
    for (entry_id, subcluster_id) in [(1i64, 10i64), (2, 11), (3, 12)] {
        seed_entry(store.pool(), entry_id, subcluster_id, 1, true).await;
    }

    // Pair {1,2} already has a stored result from an earlier run
    let mut existing = cfa_align::types::MergedAlignment::new(1, 1, 2);
    existing.ce_rms = Some(7.7);
    store.persist_results(1, &[existing]).await.unwrap();

    // Still pending: {1,3} and {2,3} are uncovered
    assert_eq!(pending_clusters(&store).await.unwrap(), vec![1]);

    let pipeline = pipeline(vec![Arc::new(StubCe)]);
    full_pass(&store, &pipeline).await;

    assert_eq!(count(store.pool(), "alignment_results").await, 3);
    assert!(pending_clusters(&store).await.unwrap().is_empty());

    // The pre-existing result kept its original value
    let kept: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM alignment_results WHERE ce_rms = 7.7")
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(kept, 1);
}

#[tokio::test]
async fn test_backend_failure_leaves_other_metrics() {
    let store = test_store().await;
    for (entry_id, subcluster_id) in [(1i64, 10i64), (2, 11), (3, 12)] {
        seed_entry(store.pool(), entry_id, subcluster_id, 1, true).await;
    }

    // TM fails for every pair touching entry 3
    let pipeline = pipeline(vec![
        Arc::new(StubCe),
        Arc::new(StubTm { fail_on: Some("/3.cif") }),
    ]);
    full_pass(&store, &pipeline).await;

    // All three pairs stored; pairs with entry 3 carry CE metrics only
    assert_eq!(count(store.pool(), "alignment_results").await, 3);
    let ce_only: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM alignment_results WHERE ce_rms IS NOT NULL AND tm_rms IS NULL",
    )
    .fetch_one(store.pool())
    .await
    .unwrap();
    assert_eq!(ce_only, 2);

    // Completeness is judged on result existence, so nothing is pending
    assert!(pending_clusters(&store).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_clusters_are_independent_units() {
    let store = test_store().await;
    // Cluster 1: two reps; cluster 2: two reps; cluster 3: singleton
    seed_entry(store.pool(), 1, 10, 1, true).await;
    seed_entry(store.pool(), 2, 11, 1, true).await;
    seed_entry(store.pool(), 3, 12, 2, true).await;
    seed_entry(store.pool(), 4, 13, 2, true).await;
    seed_entry(store.pool(), 5, 14, 3, true).await;

    assert_eq!(pending_clusters(&store).await.unwrap(), vec![1, 2]);

    let pipeline = pipeline(vec![Arc::new(StubCe)]);
    let enqueued = full_pass(&store, &pipeline).await;

    assert_eq!(enqueued, 2);
    assert_eq!(count(store.pool(), "alignment_results").await, 2);
    assert!(pending_clusters(&store).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_non_representative_entries_never_pair() {
    let store = test_store().await;
    seed_entry(store.pool(), 1, 10, 1, true).await;
    seed_entry(store.pool(), 2, 11, 1, false).await;

    assert!(pending_clusters(&store).await.unwrap().is_empty());

    let pipeline = pipeline(vec![Arc::new(StubCe)]);
    assert_eq!(full_pass(&store, &pipeline).await, 0);
    assert_eq!(count(store.pool(), "alignment_results").await, 0);
}
