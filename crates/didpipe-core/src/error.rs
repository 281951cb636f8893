use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read plan file {path}: {source}")]
    PlanFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse plan file: {0}")]
    PlanFileParse(#[from] serde_yaml::Error),

    #[error("invalid plan: {0}")]
    InvalidPlan(String),
}
