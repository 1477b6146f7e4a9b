//! Core Types and Trait Definitions for CFA-ALIGN
//!
//! Defines the data carried between the scheduling stages:
//! - Catalog rows (representative entries, group memberships)
//! - Task descriptors crossing the transport seam
//! - Per-pair algorithm outcomes and the merged per-pair record
//! - The `StructureAligner` trait implemented by every comparison backend

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Metric name → value mapping returned by a comparison backend
pub type MetricMap = HashMap<String, f64>;

// ============================================================================
// Alignment kinds
// ============================================================================

/// The fixed set of comparison algorithms.
///
/// Each kind owns a disjoint subset of the merged record's metric fields:
/// CE owns `ce_rms`, TM-align owns the `tm_*` fields, FATCAT owns the
/// `fc_*` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlignmentKind {
    /// Combinatorial extension (kind id 1)
    CombinatorialExtension,
    /// TM-align (kind id 2)
    TmAlign,
    /// FATCAT flexible alignment (kind id 3)
    Fatcat,
}

impl AlignmentKind {
    /// All kinds, in id order
    pub const ALL: [AlignmentKind; 3] = [
        AlignmentKind::CombinatorialExtension,
        AlignmentKind::TmAlign,
        AlignmentKind::Fatcat,
    ];

    /// Resolve a configured kind id
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(AlignmentKind::CombinatorialExtension),
            2 => Some(AlignmentKind::TmAlign),
            3 => Some(AlignmentKind::Fatcat),
            _ => None,
        }
    }

    /// Stable numeric id used in configuration
    pub fn id(self) -> i64 {
        match self {
            AlignmentKind::CombinatorialExtension => 1,
            AlignmentKind::TmAlign => 2,
            AlignmentKind::Fatcat => 3,
        }
    }

    /// Human-readable name for logging
    pub fn name(self) -> &'static str {
        match self {
            AlignmentKind::CombinatorialExtension => "ce-align",
            AlignmentKind::TmAlign => "tm-align",
            AlignmentKind::Fatcat => "fatcat",
        }
    }
}

// ============================================================================
// Pair identity
// ============================================================================

/// Canonical identity of one unordered pair of subcluster entries.
///
/// Stored as the ordered tuple (min id, max id) so that `(a, b)` and
/// `(b, a)` map to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    pub lo: i64,
    pub hi: i64,
}

impl PairKey {
    pub fn new(a: i64, b: i64) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }
}

// ============================================================================
// Catalog rows
// ============================================================================

/// A representative subcluster entry, as seen by the pending-work resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepresentativeEntry {
    pub entry_id: i64,
    pub subcluster_id: i64,
    pub cluster_id: i64,
}

/// One (alignment group, subcluster entry) membership edge for a group
/// that already has a stored result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupMembership {
    pub group_id: i64,
    pub entry_id: i64,
}

/// A representative entry with its conformer file path, fetched when
/// building task descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub entry_id: i64,
    pub file_path: String,
    pub subcluster_id: i64,
    pub cluster_id: i64,
}

// ============================================================================
// Task descriptors
// ============================================================================

/// One entry inside a task descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    #[serde(rename = "subcluster_entry_id")]
    pub entry_id: i64,
    pub file_path: String,
    pub subcluster_id: i64,
}

/// Schedulable unit of work: one cluster and its representative entries.
///
/// Serializes to the wire shape
/// `{task_id, cluster_id, subclusters: [{subcluster_entry_id, file_path, subcluster_id}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentTask {
    pub task_id: Uuid,
    pub cluster_id: i64,
    /// Unix timestamp of enqueue time
    pub enqueued_at: i64,
    #[serde(rename = "subclusters")]
    pub entries: Vec<TaskEntry>,
}

impl AlignmentTask {
    pub fn new(cluster_id: i64, entries: Vec<TaskEntry>) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            cluster_id,
            enqueued_at: chrono::Utc::now().timestamp(),
            entries,
        }
    }
}

// ============================================================================
// Pipeline outputs
// ============================================================================

/// Output of one (pair, kind) comparison attempt that produced metrics
#[derive(Debug, Clone)]
pub struct PairOutcome {
    pub cluster_id: i64,
    pub entry_1_id: i64,
    pub entry_2_id: i64,
    pub kind: AlignmentKind,
    pub metrics: MetricMap,
}

/// Per-pair union of metric outputs across all kinds run for that pair.
///
/// Sparse: each kind populates only its own fields and leaves the rest
/// unset.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedAlignment {
    pub cluster_id: i64,
    pub entry_1_id: i64,
    pub entry_2_id: i64,
    pub ce_rms: Option<f64>,
    pub tm_rms: Option<f64>,
    pub tm_seq_id: Option<f64>,
    pub tm_score_chain_1: Option<f64>,
    pub tm_score_chain_2: Option<f64>,
    pub fc_rms: Option<f64>,
    pub fc_identity: Option<f64>,
    pub fc_similarity: Option<f64>,
    pub fc_score: Option<f64>,
    pub fc_align_len: Option<i64>,
}

impl MergedAlignment {
    /// Create an empty record for one pair
    pub fn new(cluster_id: i64, entry_1_id: i64, entry_2_id: i64) -> Self {
        Self {
            cluster_id,
            entry_1_id,
            entry_2_id,
            ce_rms: None,
            tm_rms: None,
            tm_seq_id: None,
            tm_score_chain_1: None,
            tm_score_chain_2: None,
            fc_rms: None,
            fc_identity: None,
            fc_similarity: None,
            fc_score: None,
            fc_align_len: None,
        }
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(self.entry_1_id, self.entry_2_id)
    }
}

/// Summary of one store batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOutcome {
    /// New alignment results inserted
    pub inserted: usize,
    /// Records that reused an already-existing group
    pub reused_groups: usize,
    /// Records skipped because their group already had a result
    pub skipped_existing: usize,
    /// Records skipped because an entry could not be resolved
    pub skipped_missing: usize,
}

// ============================================================================
// Comparison backend trait
// ============================================================================

/// Comparison backend error.
///
/// Any of these is the "no result" signal for one (pair, kind) attempt:
/// logged and excluded from merging, never fatal to the batch.
#[derive(Debug, Error)]
pub enum AlignError {
    /// I/O error launching or talking to the external tool
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tool exited with a failure status
    #[error("Tool failed ({status}): {stderr}")]
    Tool { status: i32, stderr: String },

    /// Tool output did not contain the expected metrics
    #[error("Parse error: {0}")]
    Parse(String),

    /// Backend not usable (missing binary, bad configuration)
    #[error("Backend not available: {0}")]
    Unavailable(String),
}

/// A structural comparison backend.
///
/// Given two conformer file paths, produce a mapping of this backend's
/// metric names to values, or fail. Backends are resolved once at startup
/// into the [`crate::registry::AlignerRegistry`]; configuration is
/// captured at construction.
#[async_trait::async_trait]
pub trait StructureAligner: Send + Sync {
    /// The kind this backend implements
    fn kind(&self) -> AlignmentKind;

    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Compare the two structures
    async fn align(&self, path_a: &str, path_b: &str) -> Result<MetricMap, AlignError>;
}

// ============================================================================
// Tests
// ============================================================================
