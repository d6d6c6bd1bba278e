//! `runclub run` and `runclub validate`.

use std::path::PathBuf;

use clap::Args;
use runclub_io::{load_period_input, load_state, save_state, PeriodSources};
use runclub_recon::model::PassReport;
use runclub_recon::ReconConfig;

use crate::{load_config, CliError};

#[derive(Args)]
pub struct RunArgs {
    /// Run-statistics workbook for the period
    #[arg(long)]
    pub records: PathBuf,

    /// No-run roster workbook (repeat for several groups)
    #[arg(long = "no-run")]
    pub no_run: Vec<PathBuf>,

    /// Leave-list workbook
    #[arg(long)]
    pub leave: Option<PathBuf>,

    /// TOML config file (defaults apply when omitted)
    #[arg(long, env = "RUNCLUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the state files
    #[arg(long, default_value = ".", env = "RUNCLUB_STATE_DIR")]
    pub state_dir: PathBuf,

    /// Reconcile and report without writing state
    #[arg(long)]
    pub dry_run: bool,

    /// Also print the JSON report to stdout
    #[arg(long)]
    pub json: bool,

    /// Write JSON output to file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;

    // Load everything before the pass; nothing is written on failure
    let sources = PeriodSources {
        run_records: args.records,
        no_run: args.no_run,
        leave: args.leave,
    };
    let input = load_period_input(&config, &sources).map_err(CliError::recon)?;
    let state = load_state(&args.state_dir, &config).map_err(CliError::recon)?;

    let result = runclub_recon::run(&config, input, state);

    if args.dry_run {
        eprintln!("dry run: state in {} left unchanged", args.state_dir.display());
    } else {
        save_state(&args.state_dir, &config, &result.state).map_err(|e| {
            CliError::recon(e).with_hint("merging is idempotent; re-running the same period is safe")
        })?;
    }

    if args.json || args.output.is_some() {
        let json_str = serde_json::to_string_pretty(&result.report)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = args.output {
            std::fs::write(path, &json_str)
                .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }

        if args.json {
            println!("{json_str}");
        }
    }

    print_summary(&result.report, &config);
    Ok(())
}

/// Human summary to stderr.
fn print_summary(report: &PassReport, config: &ReconConfig) {
    let s = &report.summary;
    eprintln!(
        "period {} ({}): {} run records, {} did not run",
        report.meta.period_label, report.meta.group, s.run_records, s.no_run,
    );
    eprintln!(
        "  {} qualifying, {} non-qualifying, {} on leave, {} new members exempted",
        s.qualifying, s.non_qualifying, s.exempted_leave, s.exempted_new,
    );
    eprintln!("  {} violations recorded", s.violations_recorded);

    for line in &report.violations {
        eprintln!(
            "    {} ({}, {}): {} [{}]",
            line.name,
            line.id,
            line.group,
            line.reason_text,
            line.history.join(", "),
        );
    }

    if !report.at_limit.is_empty() {
        eprintln!(
            "{} member(s) at the {}-strike limit:",
            report.at_limit.len(),
            config.history.retention,
        );
        for line in &report.at_limit {
            eprintln!("    {} ({}, {})", line.name, line.id, line.group);
        }
    }
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config(Some(&config_path)).map_err(|mut e| {
        e.hint = None;
        e
    })?;

    eprintln!(
        "valid: min distance {} km, max pace {}/km, retention {} ({} carry)",
        config.thresholds.min_distance_km,
        runclub_recon::model::format_pace(config.thresholds.max_pace_seconds),
        config.history.retention,
        config.history.carry,
    );
    eprintln!(
        "state files: {}, {}, {}",
        config.state.members, config.state.violations, config.state.non_break,
    );
    Ok(())
}
