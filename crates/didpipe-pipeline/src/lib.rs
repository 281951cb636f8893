//! Batch analysis pipeline: dataset ingestion, monthly aggregation,
//! per-comparison DID/ITS estimation, and report emission.
//!
//! Data flows strictly forward — records to aggregates to fitted models
//! to the JSON artifact — with no shared mutable state between stages.
//! Per-comparison failures are recorded in the report instead of
//! aborting the run; only dataset-level problems (unreadable file,
//! malformed rows, empty input) are fatal.

pub mod aggregate;
pub mod analysis;
pub mod dataset;
pub mod error;
pub mod report;

pub use aggregate::{aggregate_monthly, MonthlyPoint, OutcomeKind};
pub use analysis::{
    run_analysis, AnalysisReport, AnalysisSettings, ComparisonResult, ModelOutcome, TrendsOutcome,
};
pub use dataset::{load_records, ExclusionCounts, LoadedDataset};
pub use error::PipelineError;
pub use didpipe_stats::CovType;
pub use report::{format_summary, write_report};
