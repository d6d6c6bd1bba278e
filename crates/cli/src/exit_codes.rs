//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | CLI usage error (bad args)                           |
//! | 3    | Input workbook or state file could not be parsed     |
//! | 4    | A required input file does not exist                 |
//! | 5    | A member id appears twice in one state file          |
//! | 6    | Config file failed to parse or validate              |
//! | 7    | State could not be read or written                   |
//!
//! A failing run never writes state, whatever the code.

use runclub_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Malformed input: bad id, duration, distance or period header.
pub const EXIT_INPUT_FORMAT: u8 = 3;

/// Run-record sheet, roster or leave file not found.
pub const EXIT_MISSING_FILE: u8 = 4;

/// Duplicate member id in persisted state.
pub const EXIT_DUPLICATE_IDENTITY: u8 = 5;

/// Config parse or validation failure.
pub const EXIT_INVALID_CONFIG: u8 = 6;

/// Filesystem failure reading or persisting state.
pub const EXIT_PERSIST: u8 = 7;

/// Exit code for an engine or adapter error.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::InputFormat { .. } => EXIT_INPUT_FORMAT,
        ReconError::MissingFile(_) => EXIT_MISSING_FILE,
        ReconError::DuplicateIdentity { .. } => EXIT_DUPLICATE_IDENTITY,
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::Io(_) => EXIT_PERSIST,
    }
}
