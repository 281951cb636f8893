use std::path::PathBuf;

use crate::app_config::AppConfig;
use crate::error::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for
/// testing or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup
/// function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup — no
/// `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<bool>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let log_level = or_default("DIDPIPE_LOG_LEVEL", "info");
    let dataset_path = PathBuf::from(or_default("DIDPIPE_DATASET_PATH", "./data/records.csv"));
    let plan_path = PathBuf::from(or_default("DIDPIPE_PLAN_PATH", "./config/plan.yaml"));
    let output_path = PathBuf::from(or_default(
        "DIDPIPE_OUTPUT_PATH",
        "./results/did_results.json",
    ));

    let parallel_trends_alpha = parse_f64("DIDPIPE_PARALLEL_TRENDS_ALPHA", "0.10")?;
    if !(0.0..1.0).contains(&parallel_trends_alpha) || parallel_trends_alpha <= 0.0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "DIDPIPE_PARALLEL_TRENDS_ALPHA".to_string(),
            reason: format!("must be in (0, 1), got {parallel_trends_alpha}"),
        });
    }

    let robust_se = parse_bool("DIDPIPE_ROBUST_SE", "false")?;

    Ok(AppConfig {
        log_level,
        dataset_path,
        plan_path,
        output_path,
        parallel_trends_alpha,
        robust_se,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    #[test]
    fn empty_env_yields_defaults() {
        let map: HashMap<&str, &str> = HashMap::new();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.dataset_path, PathBuf::from("./data/records.csv"));
        assert_eq!(cfg.plan_path, PathBuf::from("./config/plan.yaml"));
        assert_eq!(cfg.output_path, PathBuf::from("./results/did_results.json"));
        assert!((cfg.parallel_trends_alpha - 0.10).abs() < f64::EPSILON);
        assert!(!cfg.robust_se);
    }

    #[test]
    fn paths_can_be_overridden() {
        let mut map = HashMap::new();
        map.insert("DIDPIPE_DATASET_PATH", "/tmp/posts.csv");
        map.insert("DIDPIPE_PLAN_PATH", "/tmp/plan.yaml");
        map.insert("DIDPIPE_OUTPUT_PATH", "/tmp/out.json");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.dataset_path, PathBuf::from("/tmp/posts.csv"));
        assert_eq!(cfg.plan_path, PathBuf::from("/tmp/plan.yaml"));
        assert_eq!(cfg.output_path, PathBuf::from("/tmp/out.json"));
    }

    #[test]
    fn alpha_override_is_parsed() {
        let mut map = HashMap::new();
        map.insert("DIDPIPE_PARALLEL_TRENDS_ALPHA", "0.05");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!((cfg.parallel_trends_alpha - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn non_numeric_alpha_is_invalid() {
        let mut map = HashMap::new();
        map.insert("DIDPIPE_PARALLEL_TRENDS_ALPHA", "not-a-number");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "DIDPIPE_PARALLEL_TRENDS_ALPHA"),
            "expected InvalidEnvVar, got: {result:?}"
        );
    }

    #[test]
    fn out_of_range_alpha_is_invalid() {
        let mut map = HashMap::new();
        map.insert("DIDPIPE_PARALLEL_TRENDS_ALPHA", "1.5");
        assert!(build_app_config(lookup_from_map(&map)).is_err());

        map.insert("DIDPIPE_PARALLEL_TRENDS_ALPHA", "0");
        assert!(build_app_config(lookup_from_map(&map)).is_err());
    }

    #[test]
    fn robust_se_flag_is_parsed() {
        let mut map = HashMap::new();
        map.insert("DIDPIPE_ROBUST_SE", "true");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert!(cfg.robust_se);
    }

    #[test]
    fn invalid_robust_se_flag_is_rejected() {
        let mut map = HashMap::new();
        map.insert("DIDPIPE_ROBUST_SE", "yes");
        assert!(build_app_config(lookup_from_map(&map)).is_err());
    }
}
