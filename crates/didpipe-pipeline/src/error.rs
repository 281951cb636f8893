use thiserror::Error;

use didpipe_core::ConfigError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read dataset {path}: {source}")]
    DatasetIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Structurally malformed rows (unparsable fields, missing columns)
    /// indicate upstream data corruption and abort the whole run.
    #[error("malformed dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset is empty — no usable records after exclusions")]
    EmptyDataset,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to write report {path}: {source}")]
    ReportIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    ReportSerialize(#[from] serde_json::Error),
}
