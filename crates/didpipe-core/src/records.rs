//! Record model: one social-media post or comment with its scores.

use chrono::{DateTime, Datelike, Utc};

/// Closed set of framing categories, plus a catch-all for labels the
/// upstream classifier produced that are not in the set.
///
/// Unrecognized labels are never coerced into a category; they carry the
/// raw string and are excluded from framing-score aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameLabel {
    Diplomacy,
    Threat,
    Economic,
    Humanitarian,
    Neutral,
    Unrecognized(String),
}

impl FrameLabel {
    /// Parse a classifier label. Matching is case-insensitive after
    /// trimming; anything outside the closed set becomes `Unrecognized`.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "DIPLOMACY" => FrameLabel::Diplomacy,
            "THREAT" => FrameLabel::Threat,
            "ECONOMIC" => FrameLabel::Economic,
            "HUMANITARIAN" => FrameLabel::Humanitarian,
            "NEUTRAL" => FrameLabel::Neutral,
            other => FrameLabel::Unrecognized(other.to_string()),
        }
    }

    /// Position on the diplomacy scale: THREAT −2 to DIPLOMACY +2.
    ///
    /// `None` for unrecognized labels, which must not enter numeric
    /// aggregation.
    #[must_use]
    pub fn framing_score(&self) -> Option<f64> {
        match self {
            FrameLabel::Threat => Some(-2.0),
            FrameLabel::Economic => Some(-1.0),
            FrameLabel::Neutral => Some(0.0),
            FrameLabel::Humanitarian => Some(1.0),
            FrameLabel::Diplomacy => Some(2.0),
            FrameLabel::Unrecognized(_) => None,
        }
    }
}

impl std::fmt::Display for FrameLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameLabel::Diplomacy => write!(f, "DIPLOMACY"),
            FrameLabel::Threat => write!(f, "THREAT"),
            FrameLabel::Economic => write!(f, "ECONOMIC"),
            FrameLabel::Humanitarian => write!(f, "HUMANITARIAN"),
            FrameLabel::Neutral => write!(f, "NEUTRAL"),
            FrameLabel::Unrecognized(raw) => write!(f, "UNRECOGNIZED({raw})"),
        }
    }
}

/// One collected post or comment, already scored upstream.
#[derive(Debug, Clone)]
pub struct Record {
    /// Upstream identifier (e.g. a Reddit fullname). Opaque to the core.
    pub id: String,
    /// Topic slug this record was collected for (treatment or a control).
    pub group: String,
    /// Creation time, UTC.
    pub created: DateTime<Utc>,
    /// Sentiment score in `[-1.0, 1.0]`.
    pub sentiment: f64,
    /// Framing label from the closed category set.
    pub frame: FrameLabel,
}

impl Record {
    /// Calendar-month bucket key for this record.
    #[must_use]
    pub fn month_key(&self) -> String {
        month_key(&self.created)
    }
}

/// Format a timestamp as its `YYYY-MM` month bucket.
///
/// Keys sort lexicographically in chronological order, which the
/// aggregation and period-assignment code relies on.
#[must_use]
pub fn month_key(ts: &DateTime<Utc>) -> String {
    format!("{:04}-{:02}", ts.year(), ts.month())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parse_known_labels() {
        assert_eq!(FrameLabel::parse("DIPLOMACY"), FrameLabel::Diplomacy);
        assert_eq!(FrameLabel::parse("THREAT"), FrameLabel::Threat);
        assert_eq!(FrameLabel::parse("ECONOMIC"), FrameLabel::Economic);
        assert_eq!(FrameLabel::parse("HUMANITARIAN"), FrameLabel::Humanitarian);
        assert_eq!(FrameLabel::parse("NEUTRAL"), FrameLabel::Neutral);
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(FrameLabel::parse("  diplomacy "), FrameLabel::Diplomacy);
        assert_eq!(FrameLabel::parse("Threat"), FrameLabel::Threat);
    }

    #[test]
    fn parse_unknown_label_routes_to_unrecognized() {
        let label = FrameLabel::parse("SPORTS");
        assert_eq!(label, FrameLabel::Unrecognized("SPORTS".to_string()));
    }

    #[test]
    fn framing_scale_matches_diplomacy_scale() {
        assert_eq!(FrameLabel::Threat.framing_score(), Some(-2.0));
        assert_eq!(FrameLabel::Economic.framing_score(), Some(-1.0));
        assert_eq!(FrameLabel::Neutral.framing_score(), Some(0.0));
        assert_eq!(FrameLabel::Humanitarian.framing_score(), Some(1.0));
        assert_eq!(FrameLabel::Diplomacy.framing_score(), Some(2.0));
    }

    #[test]
    fn unrecognized_has_no_framing_score() {
        let label = FrameLabel::parse("ERROR");
        assert_eq!(label.framing_score(), None);
    }

    #[test]
    fn month_key_zero_pads() {
        let ts = Utc.with_ymd_and_hms(2018, 6, 12, 9, 30, 0).unwrap();
        assert_eq!(month_key(&ts), "2018-06");
    }
}
