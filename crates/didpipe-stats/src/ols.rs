//! Ordinary least squares with Student-t inference.
//!
//! Solves the normal equations by Cholesky decomposition. A design matrix
//! whose cross-product is not positive definite is reported as a
//! degenerate design rather than being regularized away — a collinear
//! model here means the caller built a comparison that cannot identify
//! its effect (e.g. a zero-width period).

use ndarray::{Array1, Array2};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::StatsError;

/// Covariance estimator for coefficient standard errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CovType {
    /// Classic OLS standard errors. Appropriate when aggregation already
    /// reduced each bucket to one point per group per month.
    Ordinary,
    /// HC3 heteroskedasticity-robust sandwich standard errors.
    Hc3,
}

/// One fitted coefficient with its full inference.
#[derive(Debug, Clone, Serialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
    /// 95% confidence interval.
    pub ci_low: f64,
    pub ci_high: f64,
}

/// Result of one regression fit.
#[derive(Debug, Clone, Serialize)]
pub struct OlsFit {
    pub coefficients: Vec<Coefficient>,
    pub n_obs: usize,
    pub df_resid: usize,
    pub r_squared: f64,
}

impl OlsFit {
    /// Look up a coefficient by design-column name.
    #[must_use]
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }
}

/// Fit `y` on the columns of `x` (including any intercept column the
/// caller added) and report estimates, standard errors, two-sided
/// p-values, and 95% confidence intervals.
///
/// # Errors
///
/// - [`StatsError::DimensionMismatch`] if `x`, `y`, and `names` disagree.
/// - [`StatsError::UnderIdentified`] if observations ≤ parameters.
/// - [`StatsError::InsufficientData`] if `y` has zero variance.
/// - [`StatsError::DegenerateDesign`] if `X'X` is not positive definite.
#[allow(clippy::cast_precision_loss)]
pub fn fit_ols(
    names: &[&str],
    x: &Array2<f64>,
    y: &Array1<f64>,
    cov: CovType,
) -> Result<OlsFit, StatsError> {
    let n = x.nrows();
    let k = x.ncols();

    if y.len() != n {
        return Err(StatsError::DimensionMismatch {
            expected: n,
            got: y.len(),
        });
    }
    if names.len() != k {
        return Err(StatsError::DimensionMismatch {
            expected: k,
            got: names.len(),
        });
    }
    if n <= k {
        return Err(StatsError::UnderIdentified {
            observations: n,
            parameters: k,
        });
    }

    let y_mean = y.sum() / n as f64;
    let ss_tot: f64 = y.iter().map(|&yi| (yi - y_mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return Err(StatsError::InsufficientData(
            "outcome series has zero variance".to_string(),
        ));
    }

    // Normal equations: beta = (X'X)^(-1) X'y, via Cholesky.
    let xt = x.t();
    let xtx = xt.dot(x);
    let xty = xt.dot(y);

    let chol = cholesky(&xtx)?;
    let beta = chol_solve(&chol, &xty);
    let xtx_inv = chol_inverse(&chol);

    let fitted = x.dot(&beta);
    let residuals = y - &fitted;
    let rss: f64 = residuals.iter().map(|e| e * e).sum();
    if rss == 0.0 {
        return Err(StatsError::InsufficientData(
            "model fits exactly — zero residual variance leaves no basis for inference"
                .to_string(),
        ));
    }
    let df = n - k;
    let sigma2 = rss / df as f64;

    let variances = match cov {
        CovType::Ordinary => (0..k).map(|j| sigma2 * xtx_inv[[j, j]]).collect::<Vec<_>>(),
        CovType::Hc3 => hc3_variances(x, &residuals, &xtx_inv)?,
    };

    let t_dist = StudentsT::new(0.0, 1.0, df as f64)
        .map_err(|e| StatsError::Numerical(e.to_string()))?;
    let t_crit = t_dist.inverse_cdf(0.975);

    let coefficients = names
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let estimate = beta[j];
            let std_error = variances[j].max(0.0).sqrt();
            let t_value = if std_error > 0.0 {
                estimate / std_error
            } else {
                f64::INFINITY
            };
            let p_value = 2.0 * (1.0 - t_dist.cdf(t_value.abs()));
            Coefficient {
                name: (*name).to_string(),
                estimate,
                std_error,
                t_value,
                p_value,
                ci_low: estimate - t_crit * std_error,
                ci_high: estimate + t_crit * std_error,
            }
        })
        .collect();

    Ok(OlsFit {
        coefficients,
        n_obs: n,
        df_resid: df,
        r_squared: 1.0 - rss / ss_tot,
    })
}

/// Build a row-major design matrix from equal-length columns.
///
/// # Errors
///
/// Returns [`StatsError::DimensionMismatch`] if column lengths differ.
pub fn design_matrix(columns: &[Vec<f64>]) -> Result<Array2<f64>, StatsError> {
    let rows = columns.first().map_or(0, Vec::len);
    for col in columns {
        if col.len() != rows {
            return Err(StatsError::DimensionMismatch {
                expected: rows,
                got: col.len(),
            });
        }
    }
    let mut x = Array2::zeros((rows, columns.len()));
    for (j, col) in columns.iter().enumerate() {
        for (i, &v) in col.iter().enumerate() {
            x[[i, j]] = v;
        }
    }
    Ok(x)
}

/// Lower-triangular Cholesky factor of a symmetric matrix.
///
/// A non-positive pivot means the matrix is not positive definite, i.e.
/// the design is collinear.
fn cholesky(a: &Array2<f64>) -> Result<Array2<f64>, StatsError> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 1e-12 {
                    return Err(StatsError::DegenerateDesign(
                        "design matrix is rank deficient (perfect collinearity)".to_string(),
                    ));
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    Ok(l)
}

/// Solve `L L' x = b` by forward then backward substitution.
fn chol_solve(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = l.nrows();

    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * z[j];
        }
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (z[i] - sum) / l[[i, i]];
    }

    x
}

/// Invert `L L'` by solving against each unit vector.
fn chol_inverse(l: &Array2<f64>) -> Array2<f64> {
    let n = l.nrows();
    let mut inv = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut e = Array1::<f64>::zeros(n);
        e[j] = 1.0;
        let col = chol_solve(l, &e);
        for i in 0..n {
            inv[[i, j]] = col[i];
        }
    }
    inv
}

/// HC3 sandwich variances: `(X'X)^(-1) X' diag(e_i^2/(1-h_i)^2) X (X'X)^(-1)`.
fn hc3_variances(
    x: &Array2<f64>,
    residuals: &Array1<f64>,
    xtx_inv: &Array2<f64>,
) -> Result<Vec<f64>, StatsError> {
    let n = x.nrows();
    let k = x.ncols();

    let mut meat = Array2::<f64>::zeros((k, k));
    for i in 0..n {
        let xi = x.row(i);
        // Leverage h_i = x_i' (X'X)^(-1) x_i.
        let mut h = 0.0;
        for a in 0..k {
            for b in 0..k {
                h += xi[a] * xtx_inv[[a, b]] * xi[b];
            }
        }
        let denom = 1.0 - h;
        if denom <= 1e-12 {
            return Err(StatsError::DegenerateDesign(format!(
                "observation {i} has leverage 1 — HC3 weights are undefined"
            )));
        }
        let w = (residuals[i] / denom).powi(2);
        for a in 0..k {
            for b in 0..k {
                meat[[a, b]] += w * xi[a] * xi[b];
            }
        }
    }

    let sandwich = xtx_inv.dot(&meat).dot(xtx_inv);
    Ok((0..k).map(|j| sandwich[[j, j]]).collect())
}
