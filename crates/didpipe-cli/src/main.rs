use std::path::PathBuf;

use clap::{Parser, Subcommand};

use didpipe_core::AppConfig;
use didpipe_pipeline::{
    format_summary, load_records, run_analysis, write_report, AnalysisReport, AnalysisSettings,
    TrendsOutcome,
};


#[derive(Debug, Parser)]
#[command(name = "didpipe")]
#[command(about = "Period-aware DID/ITS analysis over classified social-media records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run every configured comparison and write the JSON report.
    Analyze {
        /// CSV record store (defaults to DIDPIPE_DATASET_PATH).
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// YAML analysis plan (defaults to DIDPIPE_PLAN_PATH).
        #[arg(long)]
        plan: Option<PathBuf>,
        /// Report destination (defaults to DIDPIPE_OUTPUT_PATH).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Use HC3 heteroskedasticity-robust standard errors.
        #[arg(long)]
        robust: bool,
    },
    /// Run only the parallel-trends verification and print verdicts.
    Trends {
        #[arg(long)]
        dataset: Option<PathBuf>,
        #[arg(long)]
        plan: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let config = didpipe_core::load_app_config()?;
    init_tracing(&config.log_level);

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            dataset,
            plan,
            output,
            robust,
        } => {
            let report = analyze(&config, dataset, plan, robust)?;
            let output = output.unwrap_or_else(|| config.output_path.clone());
            write_report(&output, &report)?;
            print!("{}", format_summary(&report));
            println!("\nreport written to {}", output.display());
        }
        Commands::Trends { dataset, plan } => {
            let report = analyze(&config, dataset, plan, false)?;
            print_trends(&report);
        }
    }

    Ok(())
}

fn analyze(
    config: &AppConfig,
    dataset: Option<PathBuf>,
    plan: Option<PathBuf>,
    robust: bool,
) -> anyhow::Result<AnalysisReport> {
    let dataset_path = dataset.unwrap_or_else(|| config.dataset_path.clone());
    let plan_path = plan.unwrap_or_else(|| config.plan_path.clone());

    let plan = didpipe_core::load_plan(&plan_path)?;
    let loaded = load_records(&dataset_path)?;

    let mut settings = AnalysisSettings::from_config(config);
    if robust {
        settings.cov = didpipe_pipeline::CovType::Hc3;
    }

    Ok(run_analysis(
        &loaded.records,
        loaded.exclusions,
        &plan,
        &settings,
    )?)
}

fn print_trends(report: &AnalysisReport) {
    println!(
        "{:<14} {:<10} {:<12} verdict",
        "outcome", "control", "comparison"
    );
    for cmp in &report.comparisons {
        let verdict = match &cmp.parallel_trends {
            TrendsOutcome::Ok(v) if v.pass => format!("pass (p={:.4})", v.p_value),
            TrendsOutcome::Ok(v) => format!("FAIL (p={:.4}, alpha={})", v.p_value, v.alpha),
            TrendsOutcome::Failed { reason } => format!("unavailable: {reason}"),
        };
        println!(
            "{:<14} {:<10} {:<12} {verdict}",
            cmp.outcome, cmp.control, cmp.comparison
        );
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
