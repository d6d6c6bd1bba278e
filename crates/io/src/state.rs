// Persisted state: member registry plus the two history stores

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use runclub_recon::{HistoryStore, ReconConfig, ReconError, ReconState, Registry};
use tracing::{debug, info};

fn state_path(dir: &Path, file: &str) -> PathBuf {
    dir.join(file)
}

/// Load the three state files from `dir`. Missing files start empty.
pub fn load_state(dir: &Path, config: &ReconConfig) -> Result<ReconState, ReconError> {
    let files = &config.state;
    let retention = config.history.retention;

    let members_path = state_path(dir, &files.members);
    let registry = match fs::read_to_string(&members_path) {
        Ok(text) => Registry::load(&members_path.display().to_string(), &text)?,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(file = %members_path.display(), "no member registry yet");
            Registry::new()
        }
        Err(e) => {
            return Err(ReconError::Io(format!(
                "cannot read {}: {e}",
                members_path.display()
            )))
        }
    };

    let violations = HistoryStore::load(&state_path(dir, &files.violations), retention)?;
    let non_break = HistoryStore::load(&state_path(dir, &files.non_break), retention)?;

    debug!(
        members = registry.len(),
        violations = violations.len(),
        non_break = non_break.len(),
        "state loaded"
    );
    Ok(ReconState {
        registry,
        violations,
        non_break,
    })
}

/// Write all three state files into `dir`, creating it if needed.
///
/// Each file is replaced atomically. A failure part-way can leave some files
/// updated and others not, but never a truncated file.
pub fn save_state(dir: &Path, config: &ReconConfig, state: &ReconState) -> Result<(), ReconError> {
    fs::create_dir_all(dir)
        .map_err(|e| ReconError::Io(format!("cannot create {}: {e}", dir.display())))?;

    let files = &config.state;
    write_atomic(&state_path(dir, &files.members), &state.registry.serialize())?;
    write_atomic(&state_path(dir, &files.violations), &state.violations.serialize())?;
    write_atomic(&state_path(dir, &files.non_break), &state.non_break.serialize())?;

    info!(dir = %dir.display(), "state saved");
    Ok(())
}

// Write .tmp then rename
fn write_atomic(path: &Path, contents: &str) -> Result<(), ReconError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    fs::write(&tmp_path, contents)
        .map_err(|e| ReconError::Io(format!("cannot write {}: {e}", tmp_path.display())))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        ReconError::Io(format!("cannot replace {}: {e}", path.display()))
    })
}
