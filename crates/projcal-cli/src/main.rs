//! projcal - Multi-projector color calibration CLI
//!
//! Runs the calibration pipeline against a simulated wall, inspects
//! configuration files and exports correction tables from reports.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use projcal_calibrate::EqualizationMethod;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "projcal")]
#[command(author, version, about = "Multi-projector color calibration")]
#[command(long_about = "
Camera-driven color calibration for multi-projector walls.

Examples:
  projcal simulate -o out/                       # Calibrate the default two-projector scene
  projcal simulate --scene wall.yaml --config calib.yaml -o out/
  projcal simulate -o out/ --cache crf.json      # Reuse or store the camera response
  projcal response --cache crf.json              # Re-estimate the camera response only
  projcal config                                 # Print the default configuration
  projcal config calib.yaml --check              # Validate a configuration file
  projcal export out/report.json -o luts/        # Write .cube files from a report
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Calibrate a simulated wall
    #[command(visible_alias = "sim")]
    Simulate(SimulateArgs),

    /// Re-estimate the camera response on a simulated wall
    Response(ResponseArgs),

    /// Print or validate a calibration configuration
    Config(ConfigArgs),

    /// Write .cube LUTs from a calibration report
    Export(ExportArgs),
}

#[derive(Args)]
struct SimulateArgs {
    /// Scene description (YAML); the built-in two-projector scene if omitted
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Calibration configuration (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory for the report and LUTs
    #[arg(short, long)]
    output: PathBuf,

    /// Camera response cache (JSON); loaded if present, written after the run
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Override the number of sampled levels per channel
    #[arg(long)]
    samples: Option<usize>,

    /// Override the white balance strategy
    #[arg(long)]
    method: Option<EqualizationMethod>,

    /// Write bracket and HDR frames to this directory
    #[arg(long)]
    diagnostics: Option<PathBuf>,
}

#[derive(Args)]
struct ResponseArgs {
    /// Scene description (YAML)
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Calibration configuration (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the camera response (JSON)
    #[arg(long)]
    cache: PathBuf,
}

#[derive(Args)]
struct ConfigArgs {
    /// Configuration file; defaults are used if omitted
    input: Option<PathBuf>,

    /// Only validate, print nothing on success
    #[arg(long)]
    check: bool,
}

#[derive(Args)]
struct ExportArgs {
    /// Calibration report (JSON)
    report: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Response(args) => commands::simulate::run_response(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Export(args) => commands::export::run(args),
    }
}
