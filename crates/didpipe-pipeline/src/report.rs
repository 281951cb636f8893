//! Result artifact emission.
//!
//! The JSON report is the machine-readable contract with the downstream
//! figure/report generators: full f64 precision, no rounding before
//! serialization, and failed comparisons present as explicit entries so
//! consumers can render them with the same prominence as estimates.

use std::fmt::Write as _;
use std::path::Path;

use crate::analysis::{AnalysisReport, ModelOutcome, TrendsOutcome};
use crate::error::PipelineError;

/// Write the report as pretty-printed JSON, creating parent directories
/// as needed.
///
/// # Errors
///
/// [`PipelineError::ReportIo`] on filesystem failure,
/// [`PipelineError::ReportSerialize`] if serialization fails.
pub fn write_report(path: &Path, report: &AnalysisReport) -> Result<(), PipelineError> {
    let io_err = |source: std::io::Error| PipelineError::ReportIo {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let json = serde_json::to_vec_pretty(report)?;
    std::fs::write(path, json).map_err(io_err)?;

    tracing::info!(path = %path.display(), comparisons = report.comparisons.len(), "report written");
    Ok(())
}

/// Human-readable per-comparison summary for terminal output.
///
/// Rounded for display only — the JSON artifact keeps full precision.
#[must_use]
pub fn format_summary(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<14} {:<10} {:<12} {:>10} {:<22} {:>8}  {:<5} trends",
        "outcome", "control", "comparison", "estimate", "95% CI", "p", "sig"
    );

    for cmp in &report.comparisons {
        let (estimate, ci, p, sig) = match &cmp.level_change {
            ModelOutcome::Ok(est) => (
                format!("{:+.3}", est.estimate),
                format!("[{:+.3}, {:+.3}]", est.ci_low, est.ci_high),
                format!("{:.4}", est.p_value),
                est.stars.clone(),
            ),
            ModelOutcome::Failed { reason } => (
                "—".to_string(),
                reason.clone(),
                String::new(),
                String::new(),
            ),
        };
        let trends = match &cmp.parallel_trends {
            TrendsOutcome::Ok(v) if v.pass => "pass".to_string(),
            TrendsOutcome::Ok(v) => format!("FAIL (p={:.3})", v.p_value),
            TrendsOutcome::Failed { reason } => format!("unavailable: {reason}"),
        };
        let _ = writeln!(
            out,
            "{:<14} {:<10} {:<12} {:>10} {:<22} {:>8}  {:<5} {}",
            cmp.outcome, cmp.control, cmp.comparison, estimate, ci, p, sig, trends
        );
    }

    out
}
