//! Per-comparison DID/ITS orchestration.
//!
//! For every outcome × comparison × control group the pipeline runs the
//! parallel-trends check, the level-change DID fit, the slope-change
//! DID-ITS fit, and the standardized effect size — each control group
//! independently, so one failing comparison never aborts the others.
//! Failures become `Failed` entries in the report rather than errors.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use didpipe_core::{AnalysisPlan, AppConfig, PeriodSpec, Record};
use didpipe_stats::{
    level_change, parallel_trends, slope_change_did, standardized_effect, Coefficient, CovType,
    Obs, OlsFit, StatsError, TrendsVerdict, LEVEL_TERM, SLOPE_DID_TERM,
};

use crate::aggregate::{aggregate_monthly, MonthlyPoint, OutcomeKind};
use crate::dataset::ExclusionCounts;
use crate::error::PipelineError;

/// Estimation knobs derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    /// Parallel-trends pass threshold: pass when interaction p > alpha.
    pub parallel_trends_alpha: f64,
    /// Covariance estimator for all regression fits.
    pub cov: CovType,
}

impl AnalysisSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            parallel_trends_alpha: config.parallel_trends_alpha,
            cov: if config.robust_se {
                CovType::Hc3
            } else {
                CovType::Ordinary
            },
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            parallel_trends_alpha: 0.10,
            cov: CovType::Ordinary,
        }
    }
}

/// Conventional significance stars for presentation. The exact p-value is
/// always serialized alongside; the stars never replace it.
#[must_use]
pub fn stars(p_value: f64) -> &'static str {
    if p_value < 0.001 {
        "***"
    } else if p_value < 0.01 {
        "**"
    } else if p_value < 0.05 {
        "*"
    } else {
        ""
    }
}

/// The coefficient of interest from one model fit, with the full fit
/// attached for consumers that want every term.
#[derive(Debug, Clone, Serialize)]
pub struct EffectEstimate {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub p_value: f64,
    pub stars: String,
    pub ci_low: f64,
    pub ci_high: f64,
    pub model: OlsFit,
}

impl EffectEstimate {
    fn new(coef: &Coefficient, model: OlsFit) -> Self {
        Self {
            term: coef.name.clone(),
            estimate: coef.estimate,
            std_error: coef.std_error,
            p_value: coef.p_value,
            stars: stars(coef.p_value).to_string(),
            ci_low: coef.ci_low,
            ci_high: coef.ci_high,
            model,
        }
    }
}

/// One model fit rendered as data: either an estimate or a documented
/// failure reason. Per-comparison failures are report content, not
/// control flow.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelOutcome {
    Ok(EffectEstimate),
    Failed { reason: String },
}

impl ModelOutcome {
    fn from_fit(result: Result<OlsFit, StatsError>, term: &str) -> Self {
        match result {
            Ok(fit) => match fit.coefficient(term) {
                Some(coef) => ModelOutcome::Ok(EffectEstimate::new(coef, fit.clone())),
                None => ModelOutcome::Failed {
                    reason: format!("fit succeeded but term '{term}' is missing"),
                },
            },
            Err(e) => ModelOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    /// The estimate, if this outcome carries one.
    #[must_use]
    pub fn estimate(&self) -> Option<f64> {
        match self {
            ModelOutcome::Ok(e) => Some(e.estimate),
            ModelOutcome::Failed { .. } => None,
        }
    }
}

/// Parallel-trends result rendered as data.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrendsOutcome {
    Ok(TrendsVerdict),
    Failed { reason: String },
}

/// One (outcome, control, comparison) cell of the report.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub outcome: &'static str,
    pub control: String,
    pub comparison: String,
    pub pre_period: String,
    pub post_period: String,
    pub parallel_trends: TrendsOutcome,
    /// `false` when the trends check failed or could not run — the DID
    /// estimate then rests on an unvalidated control and must be read
    /// with that caveat.
    pub validated_control: bool,
    pub level_change: ModelOutcome,
    pub slope_change: ModelOutcome,
    /// DID estimate standardized by the pooled pre-period SD. `None`
    /// when undefined (degenerate spread) or when the fit failed.
    pub effect_size: Option<f64>,
}

/// Full result artifact for one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub treatment: String,
    pub controls: Vec<String>,
    pub parallel_trends_alpha: f64,
    pub record_count: usize,
    pub exclusions: ExclusionCounts,
    pub comparisons: Vec<ComparisonResult>,
}

/// Run every configured comparison over the loaded records.
///
/// # Errors
///
/// [`PipelineError::EmptyDataset`] if `records` is empty. Everything
/// else — degenerate designs, insufficient data, failed trends checks —
/// is isolated to its comparison and reported as data.
pub fn run_analysis(
    records: &[Record],
    exclusions: ExclusionCounts,
    plan: &AnalysisPlan,
    settings: &AnalysisSettings,
) -> Result<AnalysisReport, PipelineError> {
    if records.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }

    let mut comparisons = Vec::new();
    for outcome in [OutcomeKind::Sentiment, OutcomeKind::FramingScore] {
        run_outcome(records, plan, settings, outcome, &mut comparisons);
    }

    Ok(AnalysisReport {
        treatment: plan.treatment.clone(),
        controls: plan.controls.clone(),
        parallel_trends_alpha: settings.parallel_trends_alpha,
        record_count: records.len(),
        exclusions,
        comparisons,
    })
}

#[allow(clippy::cast_precision_loss)]
fn run_outcome(
    records: &[Record],
    plan: &AnalysisPlan,
    settings: &AnalysisSettings,
    outcome: OutcomeKind,
    results: &mut Vec<ComparisonResult>,
) {
    let points = aggregate_monthly(records, outcome);

    // Shared time axis: index over the union of observed months, so
    // missing buckets shift nothing and are simply absent.
    let months: BTreeSet<&str> = points.iter().map(|p| p.month.as_str()).collect();
    let month_index: BTreeMap<&str, f64> = months
        .iter()
        .enumerate()
        .map(|(i, m)| (*m, i as f64))
        .collect();

    let mut by_group: BTreeMap<&str, Vec<&MonthlyPoint>> = BTreeMap::new();
    for p in &points {
        by_group.entry(p.group.as_str()).or_default().push(p);
    }

    for cmp in &plan.comparisons {
        let (Some(pre), Some(post)) = (plan.period(&cmp.pre), plan.period(&cmp.post)) else {
            // Unreachable for a plan that passed validation.
            tracing::warn!(comparison = %cmp.name, "comparison references unknown period");
            continue;
        };

        for control in &plan.controls {
            let result = run_comparison(
                &by_group,
                &month_index,
                plan.treatment.as_str(),
                control.as_str(),
                cmp.name.as_str(),
                pre,
                post,
                outcome,
                settings,
            );
            results.push(result);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_comparison(
    by_group: &BTreeMap<&str, Vec<&MonthlyPoint>>,
    month_index: &BTreeMap<&str, f64>,
    treatment: &str,
    control: &str,
    comparison: &str,
    pre: &PeriodSpec,
    post: &PeriodSpec,
    outcome: OutcomeKind,
    settings: &AnalysisSettings,
) -> ComparisonResult {
    let empty = Vec::new();
    let treat_points = by_group.get(treatment).unwrap_or(&empty);
    let ctrl_points = by_group.get(control).unwrap_or(&empty);

    let treat_pre = window_points(treat_points, pre, month_index);
    let ctrl_pre = window_points(ctrl_points, pre, month_index);

    let trends = match parallel_trends(
        &treat_pre,
        &ctrl_pre,
        settings.parallel_trends_alpha,
        settings.cov,
    ) {
        Ok(verdict) => {
            if !verdict.pass {
                tracing::warn!(
                    outcome = outcome.name(),
                    control,
                    comparison,
                    p_value = verdict.p_value,
                    "parallel-trends check failed — control is unvalidated"
                );
            }
            TrendsOutcome::Ok(verdict)
        }
        Err(e) => {
            tracing::warn!(
                outcome = outcome.name(),
                control,
                comparison,
                error = %e,
                "parallel-trends check could not run"
            );
            TrendsOutcome::Failed {
                reason: e.to_string(),
            }
        }
    };
    let validated_control = matches!(&trends, TrendsOutcome::Ok(v) if v.pass);

    let treat_post = window_points(treat_points, post, month_index);
    let ctrl_post = window_points(ctrl_points, post, month_index);

    // A window that contributes fewer than two monthly buckets for a
    // group cannot distinguish a level shift from single-month noise;
    // refuse to estimate instead of emitting a confident coefficient.
    let (level, slope) = if let Some(reason) = coverage_deficit(
        treat_pre.len(),
        ctrl_pre.len(),
        treat_post.len(),
        ctrl_post.len(),
    ) {
        tracing::warn!(
            outcome = outcome.name(),
            control,
            comparison,
            reason,
            "skipping model fits"
        );
        (
            ModelOutcome::Failed {
                reason: reason.clone(),
            },
            ModelOutcome::Failed { reason },
        )
    } else {
        let mut obs = Vec::new();
        collect_obs(treat_points, true, pre, post, month_index, &mut obs);
        collect_obs(ctrl_points, false, pre, post, month_index, &mut obs);

        let level = ModelOutcome::from_fit(level_change(&obs, settings.cov), LEVEL_TERM);
        if let ModelOutcome::Failed { reason } = &level {
            tracing::warn!(
                outcome = outcome.name(),
                control,
                comparison,
                reason,
                "level-change fit failed"
            );
        }

        let slope = ModelOutcome::from_fit(slope_change_did(&obs, settings.cov), SLOPE_DID_TERM);
        if let ModelOutcome::Failed { reason } = &slope {
            tracing::warn!(
                outcome = outcome.name(),
                control,
                comparison,
                reason,
                "slope-change fit failed"
            );
        }
        (level, slope)
    };

    let treat_pre_means: Vec<f64> = treat_pre.iter().map(|&(_, y)| y).collect();
    let ctrl_pre_means: Vec<f64> = ctrl_pre.iter().map(|&(_, y)| y).collect();
    let effect_size = level
        .estimate()
        .and_then(|est| standardized_effect(est, &treat_pre_means, &ctrl_pre_means));

    ComparisonResult {
        outcome: outcome.name(),
        control: control.to_string(),
        comparison: comparison.to_string(),
        pre_period: pre.name.clone(),
        post_period: post.name.clone(),
        parallel_trends: trends,
        validated_control,
        level_change: level,
        slope_change: slope,
        effect_size,
    }
}

/// Minimum monthly buckets each group must contribute to each window
/// before a model fit is attempted.
const MIN_WINDOW_BUCKETS: usize = 2;

/// Reason string when some (group, window) cell is too thin to model,
/// or `None` when every cell clears [`MIN_WINDOW_BUCKETS`].
fn coverage_deficit(
    treat_pre: usize,
    ctrl_pre: usize,
    treat_post: usize,
    ctrl_post: usize,
) -> Option<String> {
    let cells = [
        ("treatment pre", treat_pre),
        ("control pre", ctrl_pre),
        ("treatment post", treat_post),
        ("control post", ctrl_post),
    ];
    let thin: Vec<String> = cells
        .iter()
        .filter(|&&(_, n)| n < MIN_WINDOW_BUCKETS)
        .map(|&(name, n)| format!("{name}: {n}"))
        .collect();
    if thin.is_empty() {
        None
    } else {
        Some(format!(
            "insufficient data: fewer than {MIN_WINDOW_BUCKETS} monthly buckets in {}",
            thin.join(", ")
        ))
    }
}

/// `(time, mean)` points of one group restricted to a period window.
fn window_points(
    points: &[&MonthlyPoint],
    period: &PeriodSpec,
    month_index: &BTreeMap<&str, f64>,
) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter(|p| period.contains_month(&p.month))
        .filter_map(|p| month_index.get(p.month.as_str()).map(|&t| (t, p.mean)))
        .collect()
}

fn collect_obs(
    points: &[&MonthlyPoint],
    treated: bool,
    pre: &PeriodSpec,
    post: &PeriodSpec,
    month_index: &BTreeMap<&str, f64>,
    obs: &mut Vec<Obs>,
) {
    for p in points {
        let is_post = if pre.contains_month(&p.month) {
            false
        } else if post.contains_month(&p.month) {
            true
        } else {
            continue;
        };
        if let Some(&time) = month_index.get(p.month.as_str()) {
            obs.push(Obs {
                time,
                treated,
                post: is_post,
                y: p.mean,
            });
        }
    }
}
