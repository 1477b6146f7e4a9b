//! Comparison backends
//!
//! One adapter per [`crate::types::AlignmentKind`], each wrapping an
//! external structural-alignment tool. Adapters run the configured
//! command, parse its stdout into a metric mapping, and report any
//! failure as the per-(pair, kind) "no result" signal.

pub mod ce;
pub mod fatcat;
pub mod tm;

pub use ce::CeAligner;
pub use fatcat::FatcatAligner;
pub use tm::TmAligner;

use crate::types::AlignError;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Run an external alignment tool and return its stdout.
///
/// A non-zero exit status carries the trimmed stderr in the error.
pub(crate) async fn run_tool(command: &str, args: &[String]) -> Result<String, AlignError> {
    debug!(command = command, args = ?args, "Running alignment tool");

    let output = Command::new(command)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(AlignError::Tool {
            status: output.status.code().unwrap_or(-1),
            stderr,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse the first floating-point token following `label` within a
/// whitespace-tokenized line, tolerating a trailing `%` or `,`.
pub(crate) fn token_after(tokens: &[&str], label: &str) -> Option<f64> {
    let pos = tokens.iter().position(|t| *t == label)?;
    let raw = tokens.get(pos + 1)?;
    raw.trim_end_matches(['%', ','].as_ref()).parse::<f64>().ok()
}
