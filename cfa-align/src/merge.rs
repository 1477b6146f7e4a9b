//! Result merging
//!
//! Collapses one cluster's (pair × kind) outcome stream into one merged
//! record per pair. Each kind writes only its own field subset; a
//! duplicate (pair, kind) outcome overwrites (last value wins) rather
//! than failing.

use crate::types::{AlignmentKind, MergedAlignment, PairKey, PairOutcome};
use std::collections::BTreeMap;

/// Merge per-(pair, kind) outcomes into per-pair records.
///
/// Pairs with no outcomes are simply absent; the next pending-work pass
/// picks them up again.
pub fn merge_outcomes(outcomes: &[PairOutcome]) -> Vec<MergedAlignment> {
    let mut merged: BTreeMap<PairKey, MergedAlignment> = BTreeMap::new();

    for outcome in outcomes {
        let key = PairKey::new(outcome.entry_1_id, outcome.entry_2_id);
        let record = merged.entry(key).or_insert_with(|| {
            MergedAlignment::new(outcome.cluster_id, outcome.entry_1_id, outcome.entry_2_id)
        });

        match outcome.kind {
            AlignmentKind::CombinatorialExtension => {
                record.ce_rms = outcome.metrics.get("ce_rms").copied();
            }
            AlignmentKind::TmAlign => {
                record.tm_rms = outcome.metrics.get("tm_rms").copied();
                record.tm_seq_id = outcome.metrics.get("tm_seq_id").copied();
                record.tm_score_chain_1 = outcome.metrics.get("tm_score_chain_1").copied();
                record.tm_score_chain_2 = outcome.metrics.get("tm_score_chain_2").copied();
            }
            AlignmentKind::Fatcat => {
                record.fc_rms = outcome.metrics.get("fc_rms").copied();
                record.fc_identity = outcome.metrics.get("fc_identity").copied();
                record.fc_similarity = outcome.metrics.get("fc_similarity").copied();
                record.fc_score = outcome.metrics.get("fc_score").copied();
                record.fc_align_len = outcome.metrics.get("fc_align_len").map(|v| *v as i64);
            }
        }
    }

    merged.into_values().collect()
}
