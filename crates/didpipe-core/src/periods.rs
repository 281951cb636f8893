//! Analysis plan: named period windows, groups, and comparisons.
//!
//! Period boundaries are configuration input decided once per run — they
//! are never inferred from the data, and gap months between periods (e.g.
//! the summit months themselves) stay excluded rather than being absorbed
//! into a neighboring window.

use std::collections::HashSet;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One named, inclusive date window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSpec {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodSpec {
    /// Whether `date` falls inside this window (inclusive on both ends).
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// `YYYY-MM` key of the first month of the window.
    #[must_use]
    pub fn start_month(&self) -> String {
        format_month(self.start)
    }

    /// `YYYY-MM` key of the last month of the window.
    #[must_use]
    pub fn end_month(&self) -> String {
        format_month(self.end)
    }

    /// Whether a `YYYY-MM` month key falls inside this window at month
    /// granularity.
    #[must_use]
    pub fn contains_month(&self, month: &str) -> bool {
        month >= self.start_month().as_str() && month <= self.end_month().as_str()
    }
}

/// A pre/post period pair to estimate an intervention effect over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    /// Label for the event, e.g. `singapore` or `hanoi`.
    pub name: String,
    /// Name of the pre-intervention period.
    pub pre: String,
    /// Name of the post-intervention period.
    pub post: String,
}

/// Full per-run analysis plan, loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisPlan {
    /// Slug of the treatment group.
    pub treatment: String,
    /// Control group slugs; each is compared against independently.
    pub controls: Vec<String>,
    pub periods: Vec<PeriodSpec>,
    pub comparisons: Vec<Comparison>,
}

impl AnalysisPlan {
    /// Look up a period by name.
    #[must_use]
    pub fn period(&self, name: &str) -> Option<&PeriodSpec> {
        self.periods.iter().find(|p| p.name == name)
    }

    /// Assign a date to its period, or `None` if it falls in a gap or
    /// outside every window. Validation guarantees at most one match.
    #[must_use]
    pub fn assign_period(&self, date: NaiveDate) -> Option<&str> {
        self.periods
            .iter()
            .find(|p| p.contains(date))
            .map(|p| p.name.as_str())
    }

    /// Assign a `YYYY-MM` month key to its period at month granularity.
    #[must_use]
    pub fn assign_month(&self, month: &str) -> Option<&str> {
        self.periods
            .iter()
            .find(|p| p.contains_month(month))
            .map(|p| p.name.as_str())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| ConfigError::InvalidPlan(msg);

        if self.treatment.trim().is_empty() {
            return Err(invalid("treatment group must not be empty".to_string()));
        }
        if self.controls.is_empty() {
            return Err(invalid("at least one control group is required".to_string()));
        }
        let mut seen_controls = HashSet::new();
        for control in &self.controls {
            if control == &self.treatment {
                return Err(invalid(format!(
                    "control '{control}' duplicates the treatment group"
                )));
            }
            if !seen_controls.insert(control.as_str()) {
                return Err(invalid(format!("duplicate control group '{control}'")));
            }
        }

        if self.periods.is_empty() {
            return Err(invalid("at least one period is required".to_string()));
        }
        let mut seen_periods = HashSet::new();
        for period in &self.periods {
            if !seen_periods.insert(period.name.as_str()) {
                return Err(invalid(format!("duplicate period name '{}'", period.name)));
            }
            if period.start > period.end {
                return Err(invalid(format!(
                    "period '{}' starts after it ends ({} > {})",
                    period.name, period.start, period.end
                )));
            }
        }

        // Non-overlap is enforced at month granularity: the aggregation
        // buckets by calendar month, so two periods sharing a month would
        // double-assign that month's points.
        let mut sorted: Vec<&PeriodSpec> = self.periods.iter().collect();
        sorted.sort_by_key(|p| p.start);
        for pair in sorted.windows(2) {
            if pair[0].end_month() >= pair[1].start_month() {
                return Err(invalid(format!(
                    "periods '{}' and '{}' overlap at month granularity",
                    pair[0].name, pair[1].name
                )));
            }
        }

        if self.comparisons.is_empty() {
            return Err(invalid("at least one comparison is required".to_string()));
        }
        for cmp in &self.comparisons {
            let pre = self
                .period(&cmp.pre)
                .ok_or_else(|| invalid(format!(
                    "comparison '{}' references unknown period '{}'",
                    cmp.name, cmp.pre
                )))?;
            let post = self
                .period(&cmp.post)
                .ok_or_else(|| invalid(format!(
                    "comparison '{}' references unknown period '{}'",
                    cmp.name, cmp.post
                )))?;
            if pre.start >= post.start {
                return Err(invalid(format!(
                    "comparison '{}': pre period '{}' does not precede post period '{}'",
                    cmp.name, cmp.pre, cmp.post
                )));
            }
        }

        Ok(())
    }
}

fn format_month(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Load and validate the analysis plan from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation.
pub fn load_plan(path: &Path) -> Result<AnalysisPlan, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PlanFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    plan_from_yaml(&content)
}

/// Parse and validate a plan from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` on parse or validation failure.
pub fn plan_from_yaml(content: &str) -> Result<AnalysisPlan, ConfigError> {
    let plan: AnalysisPlan = serde_yaml::from_str(content)?;
    plan.validate()?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_plan() -> AnalysisPlan {
        AnalysisPlan {
            treatment: "nk".to_string(),
            controls: vec!["china".to_string(), "iran".to_string()],
            periods: vec![
                PeriodSpec {
                    name: "pre_singapore".to_string(),
                    start: ymd(2017, 1, 1),
                    end: ymd(2018, 2, 28),
                },
                PeriodSpec {
                    name: "singapore_hanoi".to_string(),
                    start: ymd(2018, 6, 1),
                    end: ymd(2019, 1, 31),
                },
                PeriodSpec {
                    name: "post_hanoi".to_string(),
                    start: ymd(2019, 3, 1),
                    end: ymd(2019, 12, 31),
                },
            ],
            comparisons: vec![
                Comparison {
                    name: "singapore".to_string(),
                    pre: "pre_singapore".to_string(),
                    post: "singapore_hanoi".to_string(),
                },
                Comparison {
                    name: "hanoi".to_string(),
                    pre: "singapore_hanoi".to_string(),
                    post: "post_hanoi".to_string(),
                },
            ],
        }
    }

    #[test]
    fn sample_plan_validates() {
        assert!(sample_plan().validate().is_ok());
    }

    #[test]
    fn assigns_dates_inside_periods() {
        let plan = sample_plan();
        assert_eq!(plan.assign_period(ymd(2017, 7, 4)), Some("pre_singapore"));
        assert_eq!(plan.assign_period(ymd(2018, 9, 1)), Some("singapore_hanoi"));
        assert_eq!(plan.assign_period(ymd(2019, 6, 15)), Some("post_hanoi"));
    }

    #[test]
    fn boundary_dates_belong_to_their_period() {
        let plan = sample_plan();
        // Start and end instants are inclusive.
        assert_eq!(plan.assign_period(ymd(2017, 1, 1)), Some("pre_singapore"));
        assert_eq!(plan.assign_period(ymd(2018, 2, 28)), Some("pre_singapore"));
        assert_eq!(plan.assign_period(ymd(2018, 6, 1)), Some("singapore_hanoi"));
        assert_eq!(plan.assign_period(ymd(2019, 1, 31)), Some("singapore_hanoi"));
    }

    #[test]
    fn gap_and_out_of_range_dates_are_excluded() {
        let plan = sample_plan();
        // Transition months between periods are deliberate exclusions.
        assert_eq!(plan.assign_period(ymd(2018, 4, 15)), None);
        assert_eq!(plan.assign_period(ymd(2019, 2, 10)), None);
        // Before and after every window.
        assert_eq!(plan.assign_period(ymd(2016, 12, 31)), None);
        assert_eq!(plan.assign_period(ymd(2020, 1, 1)), None);
    }

    #[test]
    fn every_date_gets_at_most_one_period() {
        let plan = sample_plan();
        let mut date = ymd(2016, 6, 1);
        while date < ymd(2020, 6, 1) {
            let matches = plan
                .periods
                .iter()
                .filter(|p| p.contains(date))
                .count();
            assert!(matches <= 1, "date {date} matched {matches} periods");
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn month_assignment_matches_month_windows() {
        let plan = sample_plan();
        assert_eq!(plan.assign_month("2018-02"), Some("pre_singapore"));
        assert_eq!(plan.assign_month("2018-03"), None);
        assert_eq!(plan.assign_month("2018-06"), Some("singapore_hanoi"));
        assert_eq!(plan.assign_month("2019-02"), None);
        assert_eq!(plan.assign_month("2019-03"), Some("post_hanoi"));
    }

    #[test]
    fn rejects_overlapping_periods() {
        let mut plan = sample_plan();
        plan.periods[1].start = ymd(2018, 2, 1);
        let err = plan.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidPlan(ref msg) if msg.contains("overlap")),
            "expected overlap error, got: {err:?}"
        );
    }

    #[test]
    fn rejects_periods_sharing_a_calendar_month() {
        let mut plan = sample_plan();
        // Day-level the windows are disjoint, but both touch 2018-06.
        plan.periods[0].end = ymd(2018, 6, 11);
        plan.periods[1].start = ymd(2018, 6, 13);
        let err = plan.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPlan(_)));
    }

    #[test]
    fn rejects_control_equal_to_treatment() {
        let mut plan = sample_plan();
        plan.controls.push("nk".to_string());
        assert!(plan.validate().is_err());
    }

    #[test]
    fn rejects_comparison_with_unknown_period() {
        let mut plan = sample_plan();
        plan.comparisons[0].post = "no_such_period".to_string();
        assert!(plan.validate().is_err());
    }

    #[test]
    fn rejects_comparison_with_reversed_periods() {
        let mut plan = sample_plan();
        plan.comparisons[0].pre = "singapore_hanoi".to_string();
        plan.comparisons[0].post = "pre_singapore".to_string();
        assert!(plan.validate().is_err());
    }

    #[test]
    fn parses_plan_from_yaml() {
        let yaml = r"
treatment: nk
controls: [china, iran, russia]
periods:
  - name: pre_singapore
    start: 2017-01-01
    end: 2018-02-28
  - name: singapore_hanoi
    start: 2018-06-01
    end: 2019-01-31
comparisons:
  - name: singapore
    pre: pre_singapore
    post: singapore_hanoi
";
        let plan = plan_from_yaml(yaml).expect("plan should parse");
        assert_eq!(plan.treatment, "nk");
        assert_eq!(plan.controls.len(), 3);
        assert_eq!(plan.periods.len(), 2);
        assert_eq!(plan.comparisons.len(), 1);
    }

    #[test]
    fn zero_width_period_is_a_valid_window_of_one_day() {
        // start == end is a single-day window; it parses, and downstream
        // estimation rejects it as insufficient data instead.
        let mut plan = sample_plan();
        plan.periods[2].end = plan.periods[2].start;
        assert!(plan.validate().is_ok());
        assert_eq!(plan.assign_period(ymd(2019, 3, 1)), Some("post_hanoi"));
    }
}
