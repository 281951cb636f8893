//! Pre-intervention parallel-trends check.
//!
//! Fits `y ~ time + treated + treated:time` over the pre-period points of
//! both groups and inspects the interaction term. A significant
//! interaction means the two series were already diverging before the
//! intervention, so any DID estimate against that control rests on an
//! unvalidated assumption.

use serde::Serialize;

use crate::error::StatsError;
use crate::ols::{design_matrix, fit_ols, CovType};

/// Outcome of the parallel-trends check for one (treatment, control) pair.
#[derive(Debug, Clone, Serialize)]
pub struct TrendsVerdict {
    /// Estimated pre-period slope difference (treated:time coefficient).
    pub slope_difference: f64,
    /// Two-sided p-value of the slope difference.
    pub p_value: f64,
    /// Threshold the p-value was compared against.
    pub alpha: f64,
    /// `true` when `p_value > alpha` — no significant divergence.
    pub pass: bool,
}

/// Run the parallel-trends check on pre-intervention `(time, value)`
/// points for the treatment and one control group.
///
/// # Errors
///
/// - [`StatsError::InsufficientData`] if either side has fewer than 3
///   points — too few to estimate a trend, so no p-value is produced.
/// - Propagates fit errors (degenerate design, zero variance) from the
///   underlying regression.
pub fn parallel_trends(
    treatment: &[(f64, f64)],
    control: &[(f64, f64)],
    alpha: f64,
    cov: CovType,
) -> Result<TrendsVerdict, StatsError> {
    if treatment.len() < 3 || control.len() < 3 {
        return Err(StatsError::InsufficientData(format!(
            "parallel-trends check needs at least 3 pre-period points per group, \
             got {} treatment and {} control",
            treatment.len(),
            control.len()
        )));
    }

    let n = treatment.len() + control.len();
    let mut ones = Vec::with_capacity(n);
    let mut time = Vec::with_capacity(n);
    let mut treated = Vec::with_capacity(n);
    let mut interaction = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);

    for &(t, v) in treatment {
        ones.push(1.0);
        time.push(t);
        treated.push(1.0);
        interaction.push(t);
        y.push(v);
    }
    for &(t, v) in control {
        ones.push(1.0);
        time.push(t);
        treated.push(0.0);
        interaction.push(0.0);
        y.push(v);
    }

    let x = design_matrix(&[ones, time, treated, interaction])?;
    let y = ndarray::Array1::from_vec(y);
    let fit = fit_ols(&["intercept", "time", "treated", "treated:time"], &x, &y, cov)?;

    let coef = fit
        .coefficient("treated:time")
        .ok_or_else(|| StatsError::Numerical("treated:time coefficient missing".to_string()))?;

    Ok(TrendsVerdict {
        slope_difference: coef.estimate,
        p_value: coef.p_value,
        alpha,
        pass: coef.p_value > alpha,
    })
}
