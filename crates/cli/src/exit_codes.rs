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
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | recon            | Reconciliation outcome and input codes   |
//! | 10-19   | settings         | User settings file codes                 |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (3-9)
// =============================================================================

/// At least one day is classified `mismatch` (count or aircraft limit).
pub const EXIT_RECON_MISMATCH: u8 = 3;

/// No mismatches, but at least one day with movements has no manifest.
pub const EXIT_RECON_MISSING: u8 = 4;

/// Run config failed to parse or validate.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 5;

/// Engine rejected its input (empty or unordered dates, non-array ledger).
pub const EXIT_RECON_INVALID_INPUT: u8 = 6;

/// Input or output file could not be read / written.
pub const EXIT_RECON_RUNTIME: u8 = 7;

// =============================================================================
// Settings (10-19)
// =============================================================================

/// Settings file could not be written.
pub const EXIT_SETTINGS_WRITE: u8 = 10;

// =============================================================================
// Engine Error Mapping
// =============================================================================

use pobtrack_recon::ReconError;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_RECON_INVALID_CONFIG,
        ReconError::InvalidInput(_) | ReconError::DateParse { .. } | ReconError::Parse(_) => {
            EXIT_RECON_INVALID_INPUT
        }
    }
}
