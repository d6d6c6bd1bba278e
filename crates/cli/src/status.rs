//! `runclub status` - members at or near the strike limit.

use std::path::PathBuf;

use runclub_io::load_state;
use serde_json::json;

use crate::{load_config, CliError};

pub fn cmd_status(
    config_path: Option<PathBuf>,
    state_dir: PathBuf,
    min_strikes: Option<usize>,
    json_output: bool,
) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;
    let min = min_strikes.unwrap_or(config.history.retention);
    if min == 0 {
        return Err(CliError::usage("--min-strikes must be at least 1"));
    }

    let state = load_state(&state_dir, &config).map_err(CliError::recon)?;
    let mut members = state.violations.members_at_or_above(min);
    members.sort_by_key(|(member, _)| member.id);

    if json_output {
        let rows: Vec<serde_json::Value> = members
            .iter()
            .map(|(member, labels)| {
                json!({
                    "id": member.id,
                    "name": member.name,
                    "gender": member.gender,
                    "group": member.group,
                    "labels": labels,
                })
            })
            .collect();
        let json_str = serde_json::to_string_pretty(&rows)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for (member, labels) in &members {
            let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
            println!("{}\t{}\t{}\t{}", member.id, member.name, member.group, labels.join(","));
        }
    }

    eprintln!(
        "{} member(s) with at least {} of {} strikes",
        members.len(),
        min,
        config.history.retention,
    );
    Ok(())
}
