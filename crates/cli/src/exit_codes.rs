//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success (for `run`: every key matched)                    |
//! | 1    | General error (unspecified, e.g. cannot write output)     |
//! | 2    | Usage error (bad arguments, unknown sheet or column)      |
//! | 3    | Differences found (mismatch, only-in-one-side, ambiguous) |
//! | 4    | Duplicate keys under `--on-duplicate error`               |
//! | 5    | Row without a key under `--on-missing-key error`          |
//! | 6    | Input file could not be read or parsed                    |
//! | 7    | Invalid job file                                          |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use sheetrecon_recon::{ReconError, SessionError};

/// Success - command completed, nothing to report.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown sheet or column, nothing to compare.
pub const EXIT_USAGE: u8 = 2;

/// Reconciliation ran and found at least one non-matching key.
/// Like `diff(1)`, a non-zero code means "inputs differ".
pub const EXIT_RECON_DIFFS: u8 = 3;

/// Duplicate keys found in input under the `error` policy.
pub const EXIT_RECON_DUPLICATE: u8 = 4;

/// A row lacks a key value under the `error` policy.
pub const EXIT_RECON_MISSING_KEY: u8 = 5;

/// Parse error reading input files.
pub const EXIT_PARSE: u8 = 6;

/// Job file could not be read, parsed or validated.
pub const EXIT_INVALID_JOB: u8 = 7;

/// Map a reconciler error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::DuplicateKeys(_) => EXIT_RECON_DUPLICATE,
        ReconError::MissingKey { .. } => EXIT_RECON_MISSING_KEY,
        ReconError::NoKeyColumn | ReconError::NoCompareColumns | ReconError::UnknownColumn { .. } => EXIT_USAGE,
    }
}

/// Map a session error to its exit code.
pub fn session_exit_code(err: &SessionError) -> u8 {
    match err {
        SessionError::Recon(inner) => recon_exit_code(inner),
        SessionError::NoSource(_)
        | SessionError::UnknownSheet { .. }
        | SessionError::UnknownColumn(_)
        | SessionError::NotReady => EXIT_USAGE,
    }
}
