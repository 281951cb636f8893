//! Regression and effect-size routines for the DID/ITS pipeline.
//!
//! Ordinary least squares with Student-t inference (standard errors,
//! p-values, confidence intervals), the pre-intervention parallel-trends
//! check, level-change and slope-change model builders, and Cohen's d.
//! Everything operates on already-aggregated numeric series; no I/O.

pub mod did;
pub mod effect;
pub mod error;
pub mod ols;
pub mod trends;

pub use did::{
    level_change, slope_change_did, slope_change_single, Obs, LEVEL_TERM, SLOPE_DID_TERM,
    SLOPE_TERM,
};
pub use effect::{cohens_d, pooled_sd, standardized_effect};
pub use error::StatsError;
pub use ols::{fit_ols, Coefficient, CovType, OlsFit};
pub use trends::{parallel_trends, TrendsVerdict};
