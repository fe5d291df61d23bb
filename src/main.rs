use clap::Parser;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use sts_analyzer::{AnalysisJob, AnalysisPool, AnalysisReport, AnalysisSettings, Config, EvaluationInput};

/// Analyze recorded sit-to-stand evaluations and print JSON reports
#[derive(Parser, Debug)]
#[command(name = "sts-analyzer", version, about)]
struct Cli {
    /// Config file to use instead of the per-user default
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Evaluation documents to analyze
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

#[derive(Serialize)]
struct EvaluationReport<'a> {
    evaluation_id: &'a str,
    #[serde(flatten)]
    report: &'a AnalysisReport,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let settings = AnalysisSettings::from(&config);
    let pool = AnalysisPool::new(config.worker_threads, config.cache_capacity, settings);

    // Queue everything first so workers run in parallel
    let mut pending = Vec::new();
    let mut failures = 0usize;
    for path in &cli.inputs {
        match EvaluationInput::load_from_path(path) {
            Ok(input) => {
                let evaluation_id = input.evaluation_id.clone();
                let job = AnalysisJob {
                    evaluation_id,
                    request: input.into_request(),
                };
                pending.push(pool.submit(job)?);
            }
            Err(e) => {
                log::error!("Skipping {}: {}", path.display(), e);
                failures += 1;
            }
        }
    }

    for handle in pending {
        let evaluation_id = handle.evaluation_id.clone();
        match handle.wait() {
            Ok(report) => {
                let output = EvaluationReport {
                    evaluation_id: &evaluation_id,
                    report: &report,
                };
                let json = if cli.pretty {
                    serde_json::to_string_pretty(&output)?
                } else {
                    serde_json::to_string(&output)?
                };
                println!("{}", json);
            }
            Err(e) => {
                log::error!("Evaluation {} failed: {}", evaluation_id, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} of {} evaluations failed", failures, cli.inputs.len()).into());
    }
    Ok(())
}
