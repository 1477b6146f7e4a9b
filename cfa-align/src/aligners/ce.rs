//! Combinatorial extension (CE) backend
//!
//! Wraps a CE command-line wrapper (e.g. a PyMOL `cealign` driver) that
//! prints an `RMSD = <x>` line. Produces the single `ce_rms` metric.

use super::run_tool;
use crate::config::AlignerCommand;
use crate::types::{AlignError, AlignmentKind, MetricMap, StructureAligner};

pub struct CeAligner {
    command: String,
    args: Vec<String>,
}

impl CeAligner {
    pub fn new(config: &AlignerCommand) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }
}

#[async_trait::async_trait]
impl StructureAligner for CeAligner {
    fn kind(&self) -> AlignmentKind {
        AlignmentKind::CombinatorialExtension
    }

    fn name(&self) -> &'static str {
        "ce-align"
    }

    async fn align(&self, path_a: &str, path_b: &str) -> Result<MetricMap, AlignError> {
        let mut args = self.args.clone();
        args.push(path_a.to_string());
        args.push(path_b.to_string());

        let stdout = run_tool(&self.command, &args).await?;
        let rms = parse_ce_rmsd(&stdout)?;

        let mut metrics = MetricMap::new();
        metrics.insert("ce_rms".to_string(), rms);
        Ok(metrics)
    }
}

/// Extract the RMSD value from CE output.
///
/// Accepts both `RMSD = 1.234 (120 to 120 atoms)` and `RMSD=1.234`.
fn parse_ce_rmsd(output: &str) -> Result<f64, AlignError> {
    for line in output.lines() {
        let Some(pos) = line.find("RMSD") else {
            continue;
        };
        let rest = &line[pos + "RMSD".len()..];
        let Some(eq) = rest.find('=') else {
            continue;
        };
        let value = rest[eq + 1..]
            .split_whitespace()
            .next()
            .map(|t| t.trim_end_matches(','));
        if let Some(token) = value {
            if let Ok(rms) = token.parse::<f64>() {
                return Ok(rms);
            }
        }
    }
    Err(AlignError::Parse("no RMSD value in CE output".to_string()))
}
