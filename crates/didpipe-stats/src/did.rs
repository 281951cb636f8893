//! DID level-change and ITS slope-change model builders.
//!
//! Each function assembles one design matrix from labeled observations
//! and delegates to [`fit_ols`](crate::ols::fit_ols). One fit covers one
//! (treatment, control) pair — multiple controls are estimated by calling
//! these once per control, never by pooling controls into a single
//! regression, so heterogeneous control dynamics stay visible.

use ndarray::Array1;

use crate::error::StatsError;
use crate::ols::{design_matrix, fit_ols, CovType, OlsFit};

/// One aggregated observation entering a DID/ITS fit.
#[derive(Debug, Clone, Copy)]
pub struct Obs {
    /// Shared time index (e.g. month index over the union of months).
    pub time: f64,
    /// `true` for the treatment group.
    pub treated: bool,
    /// `true` for points in the post-intervention period.
    pub post: bool,
    /// Outcome value (monthly mean sentiment or framing score).
    pub y: f64,
}

/// Name of the DID level-change coefficient in [`level_change`] fits.
pub const LEVEL_TERM: &str = "treated:post";

/// Name of the slope-change coefficient in [`slope_change_single`] fits.
pub const SLOPE_TERM: &str = "time_since:post";

/// Name of the trend-change coefficient in [`slope_change_did`] fits.
pub const SLOPE_DID_TERM: &str = "treated:time_since:post";

/// Level-change DID: `y ~ time + treated + post + treated:post`.
///
/// The `treated:post` coefficient estimates the immediate causal effect.
///
/// # Errors
///
/// [`StatsError::DegenerateDesign`] when a required contrast never varies
/// (all-pre, all-post, or single-group input); otherwise propagates fit
/// errors from the regression.
pub fn level_change(obs: &[Obs], cov: CovType) -> Result<OlsFit, StatsError> {
    require_contrast(obs, true)?;

    let columns = vec![
        obs.iter().map(|_| 1.0).collect(),
        obs.iter().map(|o| o.time).collect(),
        obs.iter().map(|o| indicator(o.treated)).collect(),
        obs.iter().map(|o| indicator(o.post)).collect(),
        obs.iter()
            .map(|o| indicator(o.treated) * indicator(o.post))
            .collect(),
    ];
    let x = design_matrix(&columns)?;
    let y = outcomes(obs);
    fit_ols(
        &["intercept", "time", "treated", "post", LEVEL_TERM],
        &x,
        &y,
        cov,
    )
}

/// Single-series interrupted time series:
/// `y ~ time + post + time_since:post`, with the interaction clock
/// re-started at the first post-period observation so the `post`
/// coefficient reads as the level jump at the intervention.
///
/// The `treated` flag on the observations is ignored.
///
/// # Errors
///
/// [`StatsError::DegenerateDesign`] when the post indicator never varies;
/// otherwise propagates fit errors.
pub fn slope_change_single(obs: &[Obs], cov: CovType) -> Result<OlsFit, StatsError> {
    require_contrast(obs, false)?;
    let t0 = intervention_time(obs);

    let columns = vec![
        obs.iter().map(|_| 1.0).collect(),
        obs.iter().map(|o| o.time).collect(),
        obs.iter().map(|o| indicator(o.post)).collect(),
        obs.iter().map(|o| time_since(o, t0)).collect(),
    ];
    let x = design_matrix(&columns)?;
    let y = outcomes(obs);
    fit_ols(&["intercept", "time", "post", SLOPE_TERM], &x, &y, cov)
}

/// Two-group DID-ITS hybrid with the full factorial up to the triple
/// interaction. The `treated:time_since:post` coefficient estimates the
/// trend change attributable to the intervention, net of the control's
/// own trend change.
///
/// # Errors
///
/// Same failure modes as [`level_change`]; additionally under-identified
/// for fewer than 9 observations (8 parameters).
pub fn slope_change_did(obs: &[Obs], cov: CovType) -> Result<OlsFit, StatsError> {
    require_contrast(obs, true)?;
    let t0 = intervention_time(obs);

    let columns = vec![
        obs.iter().map(|_| 1.0).collect(),
        obs.iter().map(|o| o.time).collect(),
        obs.iter().map(|o| indicator(o.treated)).collect(),
        obs.iter().map(|o| indicator(o.post)).collect(),
        obs.iter()
            .map(|o| indicator(o.treated) * o.time)
            .collect(),
        obs.iter()
            .map(|o| indicator(o.treated) * indicator(o.post))
            .collect(),
        obs.iter().map(|o| time_since(o, t0)).collect(),
        obs.iter()
            .map(|o| indicator(o.treated) * time_since(o, t0))
            .collect(),
    ];
    let x = design_matrix(&columns)?;
    let y = outcomes(obs);
    fit_ols(
        &[
            "intercept",
            "time",
            "treated",
            "post",
            "treated:time",
            LEVEL_TERM,
            SLOPE_TERM,
            SLOPE_DID_TERM,
        ],
        &x,
        &y,
        cov,
    )
}

fn indicator(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

fn outcomes(obs: &[Obs]) -> Array1<f64> {
    Array1::from_iter(obs.iter().map(|o| o.y))
}

/// Earliest time index among post-period observations; the ITS
/// interaction clock starts there.
fn intervention_time(obs: &[Obs]) -> f64 {
    obs.iter()
        .filter(|o| o.post)
        .map(|o| o.time)
        .fold(f64::INFINITY, f64::min)
}

fn time_since(o: &Obs, t0: f64) -> f64 {
    if o.post {
        o.time - t0
    } else {
        0.0
    }
}

/// Reject inputs where a required indicator never varies. The Cholesky
/// solve would catch these too, but the message here names the actual
/// modeling problem instead of "rank deficient".
fn require_contrast(obs: &[Obs], needs_groups: bool) -> Result<(), StatsError> {
    let any_pre = obs.iter().any(|o| !o.post);
    let any_post = obs.iter().any(|o| o.post);
    if !any_pre || !any_post {
        return Err(StatsError::DegenerateDesign(
            "post indicator never varies — a period pair must contribute both \
             pre and post observations"
                .to_string(),
        ));
    }
    if needs_groups {
        let any_treated = obs.iter().any(|o| o.treated);
        let any_control = obs.iter().any(|o| !o.treated);
        if !any_treated || !any_control {
            return Err(StatsError::DegenerateDesign(
                "group indicator never varies — both treatment and control \
                 observations are required"
                    .to_string(),
            ));
        }
    }
    Ok(())
}
