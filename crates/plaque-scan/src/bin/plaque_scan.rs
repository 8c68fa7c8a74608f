//! Command-line front end for the plaque analysis pipeline.
//!
//! Usage:
//!   plaque-scan analyze --config plaque.json --photo patient.jpg
//!   plaque-scan run --config plaque.json --session sessions/2024-05-01_12-03-04_ab12cd34
//!
//! The report is printed to stdout as JSON. Exit status is `0` when the
//! analysis succeeded, `2` when the pipeline reported an error and `1` when
//! the tool itself could not run.

use clap::{Args, Parser, Subcommand};
use plaque_scan::analysis::{AnalysisConfig, FsBlobStore};
use plaque_scan::scan::{analyze_photo, rerun_session, ScanReport};
use std::path::PathBuf;
use std::process::ExitCode;

#[cfg(feature = "tracing")]
use tracing_log::LogTracer;

#[derive(Parser, Debug)]
#[command(name = "plaque-scan")]
#[command(author, version, about = "Dental plaque coverage analysis", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); `RUST_LOG` overrides it
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a photo in a new session directory
    Analyze {
        #[command(flatten)]
        config: ConfigArg,

        /// Photograph of the patient's teeth
        #[arg(long)]
        photo: PathBuf,

        /// Parent folder for the session (default: `output_dir` from the config)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Re-run the pipeline on an existing session directory
    Run {
        #[command(flatten)]
        config: ConfigArg,

        /// Session directory containing `original_image.png`
        #[arg(long)]
        session: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ConfigArg {
    /// JSON config with model commands and parameters
    #[arg(long)]
    config: PathBuf,
}

fn init_logging(cli: &Cli) {
    #[cfg(feature = "tracing")]
    {
        let _ = LogTracer::init();
        plaque_scan::core::init_tracing(cli.json_logs, cli.verbose);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let level = plaque_scan::core::level_from_verbosity(cli.verbose);
        let _ = plaque_scan::core::init_with_level(level);
    }
}

fn run(cli: &Cli) -> Result<ScanReport, Box<dyn std::error::Error>> {
    let report = match &cli.command {
        Command::Analyze {
            config,
            photo,
            out_dir,
        } => {
            let cfg = AnalysisConfig::load_json(&config.config)?;
            let analyzer = cfg.build_analyzer(FsBlobStore)?;
            let parent = out_dir.clone().unwrap_or_else(|| cfg.output_dir());
            analyze_photo(&analyzer, photo, parent)?
        }
        Command::Run { config, session } => {
            let cfg = AnalysisConfig::load_json(&config.config)?;
            let analyzer = cfg.build_analyzer(FsBlobStore)?;
            rerun_session(&analyzer, session)?
        }
    };
    Ok(report)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(report) => {
            match serde_json::to_string_pretty(&report.result) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::FAILURE;
                }
            }
            log::info!("report written to {}", report.report_path.display());
            if report.result.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
