//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, bad names)    |
//! | 3       | Universal        | File or data could not be read/written   |
//! | 10-19   | schema           | Rule set, template, recon config rejected|
//! | 20-29   | strict           | Completed, but anomalies were recorded   |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use routerecon_io::IoError;
use routerecon_recon::ReconError;

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options, unsafe names.
pub const EXIT_USAGE: u8 = 2;

/// I/O error - a file is missing, unreadable, unwritable or malformed.
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Schema (10-19)
// =============================================================================

/// Rule set failed load-time validation.
pub const EXIT_INVALID_RULES: u8 = 10;

/// Template is not JSON or holds an illegal placeholder.
pub const EXIT_INVALID_TEMPLATE: u8 = 11;

/// Recon config failed to parse or validate.
pub const EXIT_INVALID_RECON: u8 = 12;

// =============================================================================
// Strict (20-29)
// =============================================================================

/// Completed, but warnings, collisions or resolution errors were recorded
/// and `--strict` was given.
pub const EXIT_WARNINGS: u8 = 20;

// =============================================================================
// Error mapping
// =============================================================================

pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::InvalidName { .. } => EXIT_USAGE,
        IoError::Read { .. }
        | IoError::Write { .. }
        | IoError::Workbook { .. }
        | IoError::Json { .. }
        | IoError::Reference(_)
        | IoError::NotFound(_) => EXIT_IO,
    }
}

pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) | ReconError::MissingReference(_) => {
            EXIT_INVALID_RECON
        }
        ReconError::ReferenceShape(_) => EXIT_IO,
    }
}
