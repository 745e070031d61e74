//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `sentinel` exit codes.
//! Exit codes are part of the shell contract: scripts and schedulers rely on them.
//!
//! # Exit Codes
//!
//! | Code | Meaning                                                     |
//! |------|-------------------------------------------------------------|
//! | 0    | Tables are identical                                        |
//! | 1    | Differences found (like `diff(1)`)                          |
//! | 2    | CLI usage error (bad args, unsupported location)            |
//! | 3    | Invalid job config, or pk + composite keys both given       |
//! | 4    | Key error (missing key column, rejected duplicate key)      |
//! | 5    | Cannot connect to a source                                  |
//! | 6    | Cannot fetch or inspect a table                             |
//! | 7    | Cannot write the report                                     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant below
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `recon_exit_code` / `source_exit_code` or the command

use sentinel_io::SourceError;
use sentinel_recon::ReconError;

/// Success - tables are identical.
pub const EXIT_SUCCESS: u8 = 0;

/// Differences found (missing rows or column mismatches).
pub const EXIT_DIFFS: u8 = 1;

/// Usage error - bad arguments, unsupported location string.
pub const EXIT_USAGE: u8 = 2;

/// Job config failed to parse or validate; conflicting key options.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// A key column is missing from a row, or a duplicate key under `reject`.
pub const EXIT_KEY_ERROR: u8 = 4;

/// Opening or pinging a source failed.
pub const EXIT_CONNECT: u8 = 5;

/// Reading a table (or its schema) failed.
pub const EXIT_FETCH: u8 = 6;

/// Writing the JSON report failed.
pub const EXIT_REPORT_WRITE: u8 = 7;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::ConflictingKeySpec { .. } => EXIT_INVALID_CONFIG,
        ReconError::MissingKeyColumn { .. } | ReconError::DuplicateKey { .. } => EXIT_KEY_ERROR,
    }
}

/// Map a data source error to its exit code.
pub fn source_exit_code(err: &SourceError) -> u8 {
    match err {
        SourceError::UnsupportedLocation(_) => EXIT_USAGE,
        SourceError::Connect { .. } => EXIT_CONNECT,
        SourceError::Fetch { .. } | SourceError::Introspect { .. } => EXIT_FETCH,
    }
}
