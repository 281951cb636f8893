//! Monthly per-group aggregation of record-level scores.
//!
//! Buckets with zero records are simply absent from the output — a
//! missing bucket means "no data", never a real zero-valued observation.
//! Outliers were handled (or deliberately kept) upstream; aggregation is
//! a plain arithmetic mean.

use std::collections::BTreeMap;

use serde::Serialize;

use didpipe_core::Record;

/// Which record-level score a run aggregates and models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Classifier sentiment score in `[-1, 1]`.
    Sentiment,
    /// Diplomacy-scale framing score in `[-2, +2]`; unrecognized frames
    /// contribute nothing.
    FramingScore,
}

impl OutcomeKind {
    /// The record's value for this outcome, or `None` if the record does
    /// not participate (unrecognized frame under `FramingScore`).
    #[must_use]
    pub fn value(self, record: &Record) -> Option<f64> {
        match self {
            OutcomeKind::Sentiment => Some(record.sentiment),
            OutcomeKind::FramingScore => record.frame.framing_score(),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            OutcomeKind::Sentiment => "sentiment",
            OutcomeKind::FramingScore => "framing_score",
        }
    }
}

/// One (group, month) aggregate: mean outcome and underlying count.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyPoint {
    pub group: String,
    /// `YYYY-MM` bucket key.
    pub month: String,
    pub mean: f64,
    pub count: usize,
}

/// Collapse records into per-(group, month) means.
///
/// Deterministic and order-independent: the result is sorted by (group,
/// month) and permuting the input changes nothing. Every emitted point
/// has `count >= 1`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate_monthly(records: &[Record], outcome: OutcomeKind) -> Vec<MonthlyPoint> {
    let mut buckets: BTreeMap<(String, String), (f64, usize)> = BTreeMap::new();

    for record in records {
        let Some(value) = outcome.value(record) else {
            continue;
        };
        let key = (record.group.clone(), record.month_key());
        let entry = buckets.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|((group, month), (sum, count))| MonthlyPoint {
            group,
            month,
            mean: sum / count as f64,
            count,
        })
        .collect()
}
