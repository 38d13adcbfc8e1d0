//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error (unspecified)                              |
//! | 2    | Usage error (bad args, unreadable config file, bad edit) |
//! | 3    | Estimate config failed to parse or validate              |
//! | 4    | A reference sheet could not be read, or is unusable      |
//! | 5    | No paint or labour row matches the vehicle               |
//! | 6    | Nothing to estimate (not confirmed, or no parts)         |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `CliError`'s conversions in main.rs

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing or unreadable files, edits that
/// name a part that is not selected.
pub const EXIT_USAGE: u8 = 2;

/// Estimate config TOML is malformed or fails validation.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// A paint, labour, tinkering or R&R sheet could not be read, or a
/// schedule lacks the identity columns needed to match a vehicle.
pub const EXIT_SOURCE: u8 = 4;

/// The vehicle selection matched no row in the paint or labour sheet.
pub const EXIT_NO_MATCH: u8 = 5;

/// The part table was not confirmed, or holds no parts.
pub const EXIT_NOTHING_TO_ESTIMATE: u8 = 6;
