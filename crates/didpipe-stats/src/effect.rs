//! Standardized effect sizes.
//!
//! Cohen's d with the (n−1)-weighted pooled standard deviation, plus a
//! variant that standardizes an externally estimated effect (the DID
//! coefficient) by the pooled pre-period spread of the two series.
//! Degenerate inputs (constant data, fewer than 2 points per side) yield
//! `None` — an undefined effect size, never ±infinity and never zero.

#[allow(clippy::cast_precision_loss)]
fn mean(xs: &[f64]) -> f64 {
    xs.iter().sum::<f64>() / xs.len() as f64
}

#[allow(clippy::cast_precision_loss)]
fn sample_variance(xs: &[f64]) -> Option<f64> {
    if xs.len() < 2 {
        return None;
    }
    let m = mean(xs);
    let ss: f64 = xs.iter().map(|&x| (x - m).powi(2)).sum();
    Some(ss / (xs.len() - 1) as f64)
}

/// Pooled standard deviation of two samples, weighted by each sample's
/// (n−1). `None` if either sample has fewer than 2 points.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pooled_sd(a: &[f64], b: &[f64]) -> Option<f64> {
    let va = sample_variance(a)?;
    let vb = sample_variance(b)?;
    let n1 = a.len() as f64;
    let n2 = b.len() as f64;
    let pooled = ((n1 - 1.0) * va + (n2 - 1.0) * vb) / (n1 + n2 - 2.0);
    Some(pooled.sqrt())
}

/// Cohen's d: mean difference over pooled standard deviation.
///
/// `None` when the pooled SD is zero (degenerate, constant data) or
/// either sample is too small.
#[must_use]
pub fn cohens_d(a: &[f64], b: &[f64]) -> Option<f64> {
    let sd = pooled_sd(a, b)?;
    if sd == 0.0 {
        return None;
    }
    Some((mean(a) - mean(b)) / sd)
}

/// Standardize an estimated effect (e.g. a DID coefficient) by the pooled
/// SD of two reference distributions, conventionally the pre-period
/// monthly means of treatment and control.
///
/// `None` under the same degenerate conditions as [`cohens_d`].
#[must_use]
pub fn standardized_effect(estimate: f64, a: &[f64], b: &[f64]) -> Option<f64> {
    let sd = pooled_sd(a, b)?;
    if sd == 0.0 {
        return None;
    }
    Some(estimate / sd)
}
