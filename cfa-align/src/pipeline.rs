//! Pair-alignment pipeline
//!
//! Processes one task descriptor end to end: enumerate every unordered
//! pair of the cluster's representative entries, attempt every
//! registered comparison backend on each pair, merge the outcomes into
//! per-pair records, and persist them idempotently.
//!
//! # Error Handling
//! - Per-(pair, backend) failures are logged and excluded; they never
//!   abort the batch.
//! - A malformed task (no entries) fails the whole unit.
//! - A store failure fails the unit; the batch was rolled back, so the
//!   next pending-work pass retries it without duplicates.

use crate::merge::merge_outcomes;
use crate::registry::AlignerRegistry;
use crate::store::AlignmentStore;
use crate::types::{AlignmentTask, PairOutcome, StoreOutcome};
use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

/// Pipeline for one cluster's pairwise alignment work
pub struct AlignmentPipeline {
    registry: AlignerRegistry,
}

impl AlignmentPipeline {
    pub fn new(registry: AlignerRegistry) -> Self {
        Self { registry }
    }

    /// Process one task: align, merge, store.
    ///
    /// Pair and backend attempt order carries no guarantee; all
    /// attempts complete before merging starts.
    pub async fn run_task(
        &self,
        store: &dyn AlignmentStore,
        task: &AlignmentTask,
    ) -> Result<StoreOutcome> {
        if task.entries.is_empty() {
            bail!("task {} for cluster {} has no entries", task.task_id, task.cluster_id);
        }

        info!(
            "Processing cluster {} with {} entries",
            task.cluster_id,
            task.entries.len()
        );

        let outcomes = self.execute_pairs(task).await;
        let merged = merge_outcomes(&outcomes);

        if merged.is_empty() {
            warn!("No alignments were stored for cluster {}", task.cluster_id);
            return Ok(StoreOutcome::default());
        }

        let outcome = store
            .persist_results(task.cluster_id, &merged)
            .await
            .with_context(|| format!("storing alignment results for cluster {}", task.cluster_id))?;

        Ok(outcome)
    }

    /// Attempt every (pair, backend) combination, isolating failures
    async fn execute_pairs(&self, task: &AlignmentTask) -> Vec<PairOutcome> {
        let mut outcomes = Vec::new();
        let entries = &task.entries;

        for (i, first) in entries.iter().enumerate() {
            for second in &entries[i + 1..] {
                for (kind, aligner) in self.registry.iter() {
                    debug!(
                        "Aligning ({}, {}) with {}",
                        first.entry_id,
                        second.entry_id,
                        aligner.name()
                    );

                    match aligner.align(&first.file_path, &second.file_path).await {
                        Ok(metrics) => outcomes.push(PairOutcome {
                            cluster_id: task.cluster_id,
                            entry_1_id: first.entry_id,
                            entry_2_id: second.entry_id,
                            kind,
                            metrics,
                        }),
                        Err(e) => warn!(
                            "No result for pair ({}, {}) with {}: {}",
                            first.entry_id,
                            second.entry_id,
                            aligner.name(),
                            e
                        ),
                    }
                }
            }
        }

        outcomes
    }
}
