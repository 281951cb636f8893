use std::path::PathBuf;

/// Application configuration for an analysis run.
///
/// Everything here is explicit input to the pipeline stages — there is no
/// process-wide singleton state in the statistical core.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// CSV record store (one row per post/comment).
    pub dataset_path: PathBuf,
    /// YAML analysis plan (periods, groups, comparisons).
    pub plan_path: PathBuf,
    /// JSON result artifact destination.
    pub output_path: PathBuf,
    /// Significance threshold for the parallel-trends interaction term.
    /// The check passes when the interaction p-value exceeds this.
    pub parallel_trends_alpha: f64,
    /// Use HC3 heteroskedasticity-robust standard errors instead of
    /// ordinary OLS standard errors.
    pub robust_se: bool,
}
