use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    /// The design matrix is rank deficient (perfect collinearity), e.g.
    /// a post indicator that never varies because a period has zero width.
    #[error("degenerate design: {0}")]
    DegenerateDesign(String),

    /// Fewer observations than parameters — residual degrees of freedom
    /// would be zero or negative.
    #[error("under-identified model: {observations} observations for {parameters} parameters")]
    UnderIdentified {
        observations: usize,
        parameters: usize,
    },

    /// Not enough data points to run the requested check at all.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("dimension mismatch: expected {expected} rows, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("numerical failure: {0}")]
    Numerical(String),
}
