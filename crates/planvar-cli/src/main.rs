//! planvar CLI - Project Plan Variance Analysis
//!
//! Command-line interface for loading project plans, computing deviation
//! metrics, building recommendations and exporting charts and reports.

mod commands;
mod exit;

use std::path::PathBuf;
use std::process;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::exit::ExitCode;

#[derive(Parser)]
#[command(name = "planvar")]
#[command(author, version, about = "Project plan variance analysis", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to ./planvar.toml when present)
    #[arg(short, long, global = true, env = "PLANVAR_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Status date for stage classification (default: today)
    #[arg(long, global = true, value_name = "DATE", value_parser = parse_as_of)]
    as_of: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a project plan
    Check {
        /// Plan file (.csv or .json)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the project as a tree of stages
    Outline {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the full console report: plan, metrics, recommendations, totals
    Summary {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Compute deviation metrics for one or more plans
    Metrics {
        /// Plan files; several are processed in parallel
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build recommendations for a plan
    Recommend {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Treat FILE as a displayed metrics CSV (stage, ΔT, ΔC, E)
        #[arg(long)]
        from_metrics: bool,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render an SVG chart
    Chart {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(short, long, value_enum)]
        kind: ChartChoice,

        /// Output SVG file, or a directory with --kind all
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Export the full analysis report (.html, .xlsx or .json by extension)
    Report {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ChartChoice {
    Gantt,
    Budget,
    Resources,
    Deviation,
    BudgetDynamics,
    All,
}

fn parse_as_of(raw: &str) -> Result<NaiveDate, String> {
    planvar_import::values::parse_date(raw).ok_or_else(|| format!("invalid date '{raw}'"))
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> process::ExitCode {
    // Usage errors exit 1 like every other failure; --help and --version exit 0
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::Failure
            } else {
                ExitCode::Success
            };
            return code.into();
        }
    };
    init_tracing(cli.verbose);

    let result = commands::Session::open(cli.config.as_deref(), cli.as_of)
        .and_then(|session| session.run(cli.command));

    if let Err(e) = &result {
        eprintln!("error: {e:#}");
    }
    ExitCode::from(&result).into()
}
