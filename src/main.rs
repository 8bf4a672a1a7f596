mod config;
mod data;
mod error;
mod export;
mod pipeline;
mod quant;
mod runs;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use config::Config;

/// Replicate QC and 2^-ΔΔCT relative quantification for qPCR exports.
#[derive(Parser, Debug)]
#[command(name = "deltact")]
#[command(about = "Batch qPCR replicate QC and fold-change calculation")]
#[command(version)]
struct Args {
    /// Directory containing the instrument exports (.xls / .xlsx)
    run_dir: PathBuf,

    /// Housekeeping gene used for ΔCT normalisation
    #[arg(short, long, env = "DELTACT_REFERENCE")]
    reference_target: String,

    /// Condition key of the baseline runs (e.g. "control")
    #[arg(short, long, env = "DELTACT_BASELINE")]
    baseline: String,

    /// Experimental condition key; repeat for each condition, in order
    #[arg(short, long = "condition")]
    conditions: Vec<String>,

    /// Replicate-consistency threshold in CT units
    #[arg(short, long, default_value_t = 1.0)]
    threshold: f64,

    /// Output directory [default: <run_dir>/results]
    #[arg(short, long)]
    out_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = Config {
        out_dir: args
            .out_dir
            .unwrap_or_else(|| args.run_dir.join("results")),
        run_dir: args.run_dir,
        reference_target: args.reference_target,
        baseline_condition: args.baseline,
        condition_keys: args.conditions,
        replicate_threshold: args.threshold,
    };

    info!(
        "scanning {} (reference {}, baseline {}, threshold {})",
        config.run_dir.display(),
        config.reference_target,
        config.baseline_condition,
        config.replicate_threshold
    );

    pipeline::run_batch(&config)
}
