//! TM-align backend
//!
//! Runs the `TMalign` binary on two structure files and parses its
//! summary block. Produces `tm_rms`, `tm_seq_id`, `tm_score_chain_1`
//! and `tm_score_chain_2`.

use super::run_tool;
use crate::config::AlignerCommand;
use crate::types::{AlignError, AlignmentKind, MetricMap, StructureAligner};

pub struct TmAligner {
    command: String,
    args: Vec<String>,
}

impl TmAligner {
    pub fn new(config: &AlignerCommand) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }
}

#[async_trait::async_trait]
impl StructureAligner for TmAligner {
    fn kind(&self) -> AlignmentKind {
        AlignmentKind::TmAlign
    }

    fn name(&self) -> &'static str {
        "tm-align"
    }

    async fn align(&self, path_a: &str, path_b: &str) -> Result<MetricMap, AlignError> {
        let mut args = vec![path_a.to_string(), path_b.to_string()];
        args.extend(self.args.iter().cloned());

        let stdout = run_tool(&self.command, &args).await?;
        parse_tmalign_output(&stdout)
    }
}

/// Parse the TM-align summary block.
///
/// Expected lines:
/// ```text
/// Aligned length=  120, RMSD=   1.85, Seq_ID=n_identical/n_aligned= 0.480
/// TM-score= 0.74512 (if normalized by length of Chain_1 ...)
/// TM-score= 0.71028 (if normalized by length of Chain_2 ...)
/// ```
fn parse_tmalign_output(output: &str) -> Result<MetricMap, AlignError> {
    let mut rms = None;
    let mut seq_id = None;
    let mut score_chain_1 = None;
    let mut score_chain_2 = None;

    for line in output.lines() {
        if let Some(rest) = line.split("RMSD=").nth(1) {
            let token = rest.trim_start().split([',', ' ']).next().unwrap_or("");
            rms = token.parse::<f64>().ok().or(rms);
        }
        if line.contains("Seq_ID=") {
            // Value follows the last '=' on the line
            if let Some(token) = line.rsplit('=').next() {
                seq_id = token.trim().parse::<f64>().ok().or(seq_id);
            }
        }
        if let Some(rest) = line.trim_start().strip_prefix("TM-score=") {
            let value = rest.trim_start().split_whitespace().next().unwrap_or("");
            let parsed = value.parse::<f64>().ok();
            if line.contains("Chain_1") {
                score_chain_1 = parsed.or(score_chain_1);
            } else if line.contains("Chain_2") {
                score_chain_2 = parsed.or(score_chain_2);
            }
        }
    }

    match (rms, seq_id, score_chain_1, score_chain_2) {
        (Some(rms), Some(seq_id), Some(c1), Some(c2)) => {
            let mut metrics = MetricMap::new();
            metrics.insert("tm_rms".to_string(), rms);
            metrics.insert("tm_seq_id".to_string(), seq_id);
            metrics.insert("tm_score_chain_1".to_string(), c1);
            metrics.insert("tm_score_chain_2".to_string(), c2);
            Ok(metrics)
        }
        _ => Err(AlignError::Parse(format!(
            "incomplete TM-align summary (rms={:?} seq_id={:?} chain1={:?} chain2={:?})",
            rms, seq_id, score_chain_1, score_chain_2
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
 *********************************************************************
 * TM-align (Version 20190822): protein structure alignment          *
 *********************************************************************

Name of Chain_1: /data/states/10.pdb
Name of Chain_2: /data/states/11.pdb
Length of Chain_1: 145 residues
Length of Chain_2: 151 residues

Aligned length=  120, RMSD=   1.85, Seq_ID=n_identical/n_aligned= 0.480

TM-score= 0.74512 (if normalized by length of Chain_1, i.e., LN=145, d0=4.52)
TM-score= 0.71028 (if normalized by length of Chain_2, i.e., LN=151, d0=4.61)
";

    #[test]
    fn test_parse_full_summary() {
        let metrics = parse_tmalign_output(SAMPLE).unwrap();
        assert_eq!(metrics["tm_rms"], 1.85);
        assert_eq!(metrics["tm_seq_id"], 0.48);
        assert_eq!(metrics["tm_score_chain_1"], 0.74512);
        assert_eq!(metrics["tm_score_chain_2"], 0.71028);
    }

    #[test]
    fn test_parse_truncated_output_is_error() {
        let truncated = "Aligned length=  120, RMSD=   1.85, Seq_ID=n_identical/n_aligned= 0.480\n";
        let err = parse_tmalign_output(truncated).unwrap_err();
        assert!(matches!(err, AlignError::Parse(_)));
    }

    #[test]
    fn test_parse_empty_output_is_error() {
        assert!(parse_tmalign_output("").is_err());
    }
}
