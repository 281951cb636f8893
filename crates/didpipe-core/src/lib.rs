//! Domain types and configuration for the didpipe analysis core.
//!
//! Holds the record model (sentiment score + framing label per post), the
//! period plan (named date windows, treatment/control groups, comparisons)
//! loaded from YAML, and the env-derived application configuration.

pub mod app_config;
pub mod config;
pub mod error;
pub mod periods;
pub mod records;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use periods::{load_plan, plan_from_yaml, AnalysisPlan, Comparison, PeriodSpec};
pub use records::{month_key, FrameLabel, Record};
