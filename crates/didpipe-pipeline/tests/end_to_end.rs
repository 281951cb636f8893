//! End-to-end pipeline test on a synthetic dataset with a known
//! injected post-period effect.

use std::io::Write as _;

use chrono::{TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use didpipe_core::plan_from_yaml;
use didpipe_pipeline::{
    format_summary, load_records, run_analysis, write_report, AnalysisSettings, ModelOutcome,
    TrendsOutcome,
};

const PLAN_YAML: &str = r"
treatment: nk
controls: [china]
periods:
  - name: pre
    start: 2016-01-01
    end: 2017-03-31
  - name: post
    start: 2017-04-01
    end: 2018-06-30
comparisons:
  - name: intervention
    pre: pre
    post: post
";

const RECORDS_PER_MONTH: usize = 60;
const INJECTED_EFFECT: f64 = 0.08;

/// 30 months (15 pre, 15 post), two groups, identical slopes, and a
/// +0.08 post-period level shift on the treatment series only.
fn synthetic_csv(seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.10).unwrap();
    let frames = ["NEUTRAL", "DIPLOMACY", "THREAT", "ECONOMIC", "HUMANITARIAN"];

    let mut csv = String::from("id,group,created_utc,sentiment_score,frame\n");
    let months: Vec<(i32, u32)> = (0..30)
        .map(|i| (2016 + (i / 12), u32::try_from(i % 12).unwrap() + 1))
        .collect();

    for (t, &(year, month)) in months.iter().enumerate() {
        let post = t >= 15;
        #[allow(clippy::cast_precision_loss)]
        let trend = 0.001 * t as f64;
        for group in ["nk", "china"] {
            let base = if group == "nk" { 0.05 } else { -0.02 };
            let bump = if post && group == "nk" {
                INJECTED_EFFECT
            } else {
                0.0
            };
            for i in 0..RECORDS_PER_MONTH {
                let day = rng.gen_range(1..=28);
                let ts = Utc
                    .with_ymd_and_hms(year, month, day, 12, 0, 0)
                    .unwrap()
                    .timestamp();
                let sentiment =
                    (base + trend + bump + noise.sample(&mut rng)).clamp(-1.0, 1.0);
                let frame = frames[rng.gen_range(0..frames.len())];
                csv.push_str(&format!(
                    "{group}_{year}_{month}_{i},{group},{ts},{sentiment},{frame}\n"
                ));
            }
        }
    }
    csv
}

#[test]
fn injected_effect_is_recovered_end_to_end() {
    let mut dataset = tempfile::NamedTempFile::new().unwrap();
    dataset.write_all(synthetic_csv(1234).as_bytes()).unwrap();

    let plan = plan_from_yaml(PLAN_YAML).unwrap();
    let loaded = load_records(dataset.path()).unwrap();
    assert_eq!(loaded.exclusions.dropped(), 0);

    let report = run_analysis(
        &loaded.records,
        loaded.exclusions,
        &plan,
        &AnalysisSettings::default(),
    )
    .unwrap();

    let sentiment = report
        .comparisons
        .iter()
        .find(|c| c.outcome == "sentiment")
        .expect("sentiment comparison present");

    // Parallel trends hold by construction.
    let TrendsOutcome::Ok(verdict) = &sentiment.parallel_trends else {
        panic!("trends check should run: {:?}", sentiment.parallel_trends);
    };
    assert!(verdict.pass, "trends p = {}", verdict.p_value);
    assert!(sentiment.validated_control);

    // The DID level estimate recovers the injected +0.08 shift.
    let ModelOutcome::Ok(level) = &sentiment.level_change else {
        panic!("level fit should succeed: {:?}", sentiment.level_change);
    };
    assert!(
        (level.estimate - INJECTED_EFFECT).abs() < 0.03,
        "estimate {}",
        level.estimate
    );
    assert!(level.p_value < 0.05, "p = {}", level.p_value);

    // Standardized against the pooled pre-period spread of monthly
    // means, a 0.08 shift is a large effect.
    let d = sentiment.effect_size.expect("effect size defined");
    assert!(d > 0.8, "d = {d}");

    // The framing outcome also produced an entry for the same cell.
    assert!(report
        .comparisons
        .iter()
        .any(|c| c.outcome == "framing_score" && c.control == "china"));
}

#[test]
fn missing_months_do_not_zero_fill_or_crash() {
    let csv = synthetic_csv(99);
    // Drop every china record from three scattered months.
    let filtered: String = csv
        .lines()
        .filter(|line| {
            !["2016_4_", "2016_9_", "2017_2_"]
                .iter()
                .any(|m| line.starts_with(&format!("china_{m}")))
        })
        .map(|l| format!("{l}\n"))
        .collect();

    let mut dataset = tempfile::NamedTempFile::new().unwrap();
    dataset.write_all(filtered.as_bytes()).unwrap();

    let plan = plan_from_yaml(PLAN_YAML).unwrap();
    let loaded = load_records(dataset.path()).unwrap();
    let report = run_analysis(
        &loaded.records,
        loaded.exclusions,
        &plan,
        &AnalysisSettings::default(),
    )
    .unwrap();

    let sentiment = report
        .comparisons
        .iter()
        .find(|c| c.outcome == "sentiment")
        .unwrap();
    let ModelOutcome::Ok(level) = &sentiment.level_change else {
        panic!("unbalanced panel should still fit");
    };
    assert!(
        (level.estimate - INJECTED_EFFECT).abs() < 0.04,
        "estimate {}",
        level.estimate
    );
}

#[test]
fn report_file_and_summary_are_produced() {
    let mut dataset = tempfile::NamedTempFile::new().unwrap();
    dataset.write_all(synthetic_csv(7).as_bytes()).unwrap();

    let plan = plan_from_yaml(PLAN_YAML).unwrap();
    let loaded = load_records(dataset.path()).unwrap();
    let report = run_analysis(
        &loaded.records,
        loaded.exclusions,
        &plan,
        &AnalysisSettings::default(),
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("results/did_results.json");
    write_report(&out, &report).unwrap();

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(parsed["treatment"], "nk");
    assert_eq!(
        parsed["comparisons"].as_array().unwrap().len(),
        report.comparisons.len()
    );

    let summary = format_summary(&report);
    assert!(summary.contains("china"));
    assert!(summary.contains("sentiment"));
}
