// RepairGrid CLI - repair cost estimates from reference sheets

mod browse;
mod estimate;
mod exit_codes;
mod report;
mod shell;
mod sources;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use repairgrid_estimator::model::GarageType;
use repairgrid_estimator::EstimateError;
use repairgrid_io::SourceError;

use exit_codes::{
    EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_NOTHING_TO_ESTIMATE, EXIT_NO_MATCH, EXIT_SOURCE,
    EXIT_SUCCESS, EXIT_USAGE,
};
use sources::SourceArgs;

#[derive(Parser)]
#[command(name = "repairgrid")]
#[command(about = "Vehicle repair cost estimates from paint and labour schedules")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute an estimate from an estimate config
    #[command(after_help = "\
Examples:
  repairgrid run estimate.toml
  repairgrid run estimate.toml --json
  repairgrid run estimate.toml --part 'front bumper' --set 'FRONT BUMPER:disc=10' --confirm
  repairgrid run estimate.toml --garage C --output out/estimate.json")]
    Run {
        /// Estimate config (TOML)
        config: PathBuf,

        /// Print the estimate as JSON
        #[arg(long)]
        json: bool,

        /// Also write the JSON estimate to this file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Add a part to the selection (repeatable)
        #[arg(long = "part", value_name = "PART")]
        parts: Vec<String>,

        /// Edit a part: PART:COLUMN=VALUE, COLUMN one of disc, rnr, rnr_cost,
        /// tinkering, tinkering_cost (repeatable)
        #[arg(long = "set", value_name = "PART:COLUMN=VALUE")]
        sets: Vec<String>,

        /// Confirm parts and costs
        #[arg(long)]
        confirm: bool,

        /// Override the garage type (A, B, C or D)
        #[arg(long)]
        garage: Option<GarageType>,
    },

    /// List selectable makers, models, years, cities and finishes
    #[command(after_help = "\
Examples:
  repairgrid options --data-dir sheets/
  repairgrid options -c estimate.toml --maker TOYOTA --model COROLLA
  repairgrid options --data-dir sheets/ --json")]
    Options {
        #[command(flatten)]
        sources: SourceArgs,

        /// Narrow models to this maker
        #[arg(long)]
        maker: Option<String>,

        /// Narrow years to this model
        #[arg(long)]
        model: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List parts offered by the labour sheet
    #[command(after_help = "\
Examples:
  repairgrid parts --data-dir sheets/
  repairgrid parts -c estimate.toml --json")]
    Parts {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the reference sheets load and carry the required columns
    #[command(after_help = "\
Examples:
  repairgrid validate --data-dir sheets/
  repairgrid validate -c estimate.toml --json")]
    Validate {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive estimate session (reads commands from stdin)
    #[command(after_help = "\
Examples:
  repairgrid shell --data-dir sheets/
  repairgrid shell -c estimate.toml
  printf 'confirm\\nestimate\\n' | repairgrid shell -c estimate.toml")]
    Shell {
        #[command(flatten)]
        sources: SourceArgs,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\nestimator: repairgrid-estimator ",
        env!("CARGO_PKG_VERSION"),
        "\nsettings:  $REPAIRGRID_SETTINGS or <config dir>/repairgrid/settings.json",
    )
}

/// Log output goes to stderr; `RUST_LOG` overrides the default `warn`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            eprintln!("Usage: repairgrid <command> [options]");
            eprintln!("       repairgrid --help for more information");
            Ok(())
        }
        Some(Commands::Run {
            config,
            json,
            output,
            parts,
            sets,
            confirm,
            garage,
        }) => estimate::cmd_run(estimate::RunArgs {
            config,
            json,
            output,
            parts,
            sets,
            confirm,
            garage,
        }),
        Some(Commands::Options { sources, maker, model, json }) => {
            browse::cmd_options(sources, maker, model, json)
        }
        Some(Commands::Parts { sources, json }) => browse::cmd_parts(sources, json),
        Some(Commands::Validate { sources, json }) => browse::cmd_validate(sources, json),
        Some(Commands::Shell { sources }) => shell::cmd_shell(sources),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self { code: EXIT_SOURCE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<EstimateError> for CliError {
    fn from(err: EstimateError) -> Self {
        let (code, hint) = match &err {
            EstimateError::ConfigParse(_) | EstimateError::ConfigValidation(_) => {
                (EXIT_INVALID_CONFIG, None)
            }
            EstimateError::NoMatchingContext { .. } => (
                EXIT_NO_MATCH,
                Some("run `repairgrid options` to see the vehicles the sheets cover"),
            ),
            EstimateError::UnknownPart(_) => (EXIT_USAGE, None),
            EstimateError::NotConfirmed => {
                (EXIT_NOTHING_TO_ESTIMATE, Some("set confirm = true or pass --confirm"))
            }
            EstimateError::NoParts => (EXIT_NOTHING_TO_ESTIMATE, Some("add [[parts]] or --part")),
        };
        Self {
            code,
            message: err.to_string(),
            hint: hint.map(str::to_string),
        }
    }
}

impl From<SourceError> for CliError {
    fn from(err: SourceError) -> Self {
        Self::source(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self { code: EXIT_ERROR, message: err.to_string(), hint: None }
    }
}
