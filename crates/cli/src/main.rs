// runclub - weekly run-compliance reconciliation (CLI)

mod exit_codes;
mod recon;
mod status;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use runclub_recon::{ReconConfig, ReconError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use exit_codes::*;

#[derive(Parser)]
#[command(name = "runclub")]
#[command(about = "Weekly run-compliance reconciliation for running clubs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile one period and update the persisted history
    #[command(after_help = "\
Examples:
  runclub run --records stats.xlsx --no-run no_run.xlsx
  runclub run --records stats.xlsx --no-run a.xlsx --no-run b.xlsx --leave leave.xlsx
  runclub run --records stats.xlsx --state-dir club-state --json
  runclub run --records stats.xlsx --config club.toml --dry-run --output week.json")]
    Run(recon::RunArgs),

    /// Validate a config file without running
    #[command(after_help = "\
Examples:
  runclub validate club.toml")]
    Validate {
        /// Path to the TOML config file
        config: PathBuf,
    },

    /// List members whose violation history has reached a strike count
    #[command(after_help = "\
Examples:
  runclub status
  runclub status --state-dir club-state --min-strikes 2
  runclub status --json")]
    Status {
        /// TOML config file (defaults apply when omitted)
        #[arg(long, env = "RUNCLUB_CONFIG")]
        config: Option<PathBuf>,

        /// Directory holding the state files
        #[arg(long, default_value = ".", env = "RUNCLUB_STATE_DIR")]
        state_dir: PathBuf,

        /// Minimum number of recorded violations (defaults to the retention window)
        #[arg(long)]
        min_strikes: Option<usize>,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    // RUST_LOG controls verbosity, e.g. RUST_LOG=debug
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Run(args) => recon::cmd_run(args),
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Status {
            config,
            state_dir,
            min_strikes,
            json,
        } => status::cmd_status(config, state_dir, min_strikes, json),
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
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Create error from an engine or adapter error with the matching exit code.
    pub fn recon(err: ReconError) -> Self {
        let code = recon_exit_code(&err);
        let hint = match &err {
            ReconError::MissingFile(_) => Some("check the path; inputs are not searched for".to_string()),
            ReconError::DuplicateIdentity { .. } => {
                Some("the state file is corrupt; fix or restore it before running again".to_string())
            }
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                Some("runclub validate <config> reports config problems without running".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Load and validate the config, or fall back to defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    let Some(path) = path else {
        return Ok(ReconConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            CliError::recon(ReconError::MissingFile(path.display().to_string()))
        } else {
            CliError {
                code: EXIT_INVALID_CONFIG,
                message: format!("cannot read config {}: {e}", path.display()),
                hint: None,
            }
        }
    })?;
    ReconConfig::from_toml(&text).map_err(CliError::recon)
}
