//! FATCAT backend
//!
//! Runs the `FATCAT` binary (`-p1`/`-p2` invocation) and parses its
//! summary lines. Produces `fc_rms`, `fc_identity`, `fc_similarity`,
//! `fc_score` and `fc_align_len`. Identity and similarity are reported
//! by the tool as percentages and stored as fractions.

use super::{run_tool, token_after};
use crate::config::AlignerCommand;
use crate::types::{AlignError, AlignmentKind, MetricMap, StructureAligner};

pub struct FatcatAligner {
    command: String,
    args: Vec<String>,
}

impl FatcatAligner {
    pub fn new(config: &AlignerCommand) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }
}

#[async_trait::async_trait]
impl StructureAligner for FatcatAligner {
    fn kind(&self) -> AlignmentKind {
        AlignmentKind::Fatcat
    }

    fn name(&self) -> &'static str {
        "fatcat"
    }

    async fn align(&self, path_a: &str, path_b: &str) -> Result<MetricMap, AlignError> {
        let mut args = self.args.clone();
        args.push("-p1".to_string());
        args.push(path_a.to_string());
        args.push("-p2".to_string());
        args.push(path_b.to_string());

        let stdout = run_tool(&self.command, &args).await?;
        parse_fatcat_output(&stdout)
    }
}

/// Parse the FATCAT summary lines.
///
/// Expected lines:
/// ```text
/// Twists 2 ini-len 164 ini-rmsd 3.18 opt-equ 171 opt-rmsd 2.91 chain-rmsd 3.45 Score 357.97 align-len 176 gaps 12 (6.82%)
/// P-value 1.87e-08 Afp-num 455 Identity 17.05% Similarity 43.18%
/// ```
fn parse_fatcat_output(output: &str) -> Result<MetricMap, AlignError> {
    let mut rms = None;
    let mut score = None;
    let mut align_len = None;
    let mut identity = None;
    let mut similarity = None;

    for line in output.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        rms = token_after(&tokens, "opt-rmsd").or(rms);
        score = token_after(&tokens, "Score").or(score);
        align_len = token_after(&tokens, "align-len").or(align_len);
        identity = token_after(&tokens, "Identity").map(|v| v / 100.0).or(identity);
        similarity = token_after(&tokens, "Similarity").map(|v| v / 100.0).or(similarity);
    }

    match (rms, score, align_len, identity, similarity) {
        (Some(rms), Some(score), Some(align_len), Some(identity), Some(similarity)) => {
            let mut metrics = MetricMap::new();
            metrics.insert("fc_rms".to_string(), rms);
            metrics.insert("fc_score".to_string(), score);
            metrics.insert("fc_align_len".to_string(), align_len);
            metrics.insert("fc_identity".to_string(), identity);
            metrics.insert("fc_similarity".to_string(), similarity);
            Ok(metrics)
        }
        _ => Err(AlignError::Parse(format!(
            "incomplete FATCAT summary (rms={:?} score={:?} len={:?} id={:?} sim={:?})",
            rms, score, align_len, identity, similarity
        ))),
    }
}
