//! CSV record-store ingestion with per-record exclusion accounting.
//!
//! Domain errors (out-of-range timestamp or sentiment, unrecognized frame
//! label) are fatal for the offending record only: the record is excluded
//! — never coerced into a default value — and the exclusion is counted.
//! Structural corruption (unparsable fields, missing columns) aborts the
//! run instead.

use std::path::Path;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use didpipe_core::{FrameLabel, Record};

use crate::error::PipelineError;

/// One CSV row as produced by the collection/classification collaborators.
#[derive(Debug, Deserialize)]
struct RawRecord {
    id: String,
    group: String,
    /// Unix epoch seconds.
    created_utc: i64,
    sentiment_score: f64,
    frame: String,
}

/// Counts of records excluded (or partially excluded) during ingestion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExclusionCounts {
    /// Epoch timestamp outside the representable range — record dropped.
    pub invalid_timestamp: usize,
    /// Sentiment outside `[-1, 1]` (or NaN) — record dropped.
    pub out_of_range_sentiment: usize,
    /// Frame label outside the closed set — record kept for sentiment but
    /// excluded from framing-score aggregation.
    pub unrecognized_frame: usize,
}

impl ExclusionCounts {
    /// Records dropped entirely (unrecognized frames are not drops).
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.invalid_timestamp + self.out_of_range_sentiment
    }
}

/// Result of loading a record store.
#[derive(Debug)]
pub struct LoadedDataset {
    pub records: Vec<Record>,
    pub exclusions: ExclusionCounts,
}

/// Load the CSV record store at `path`.
///
/// # Errors
///
/// - [`PipelineError::DatasetIo`] if the file cannot be opened.
/// - [`PipelineError::Csv`] on structurally malformed rows.
/// - [`PipelineError::EmptyDataset`] if no usable records remain.
pub fn load_records(path: &Path) -> Result<LoadedDataset, PipelineError> {
    let file = std::fs::File::open(path).map_err(|e| PipelineError::DatasetIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let mut records = Vec::new();
    let mut exclusions = ExclusionCounts::default();

    for row in reader.deserialize::<RawRecord>() {
        let raw = row?;

        let Some(created) = DateTime::from_timestamp(raw.created_utc, 0) else {
            exclusions.invalid_timestamp += 1;
            tracing::debug!(id = %raw.id, epoch = raw.created_utc, "excluding record: invalid timestamp");
            continue;
        };

        if !(-1.0..=1.0).contains(&raw.sentiment_score) {
            exclusions.out_of_range_sentiment += 1;
            tracing::debug!(
                id = %raw.id,
                score = raw.sentiment_score,
                "excluding record: sentiment outside [-1, 1]"
            );
            continue;
        }

        let frame = FrameLabel::parse(&raw.frame);
        if matches!(frame, FrameLabel::Unrecognized(_)) {
            exclusions.unrecognized_frame += 1;
            tracing::debug!(id = %raw.id, frame = %frame, "frame label outside closed set");
        }

        records.push(Record {
            id: raw.id,
            group: raw.group,
            created,
            sentiment: raw.sentiment_score,
            frame,
        });
    }

    if records.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }

    tracing::info!(
        records = records.len(),
        dropped = exclusions.dropped(),
        unrecognized_frames = exclusions.unrecognized_frame,
        "dataset loaded"
    );

    Ok(LoadedDataset {
        records,
        exclusions,
    })
}
