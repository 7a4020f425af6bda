//! # Shared User Record Types and Constants
//!
//! Field limits and formats that clients and the server must agree on. The
//! server enforces them; clients can use them to pre-validate input.

/// Identifier of a user record. Positive, assigned by the server, never
/// reused.
pub type UserId = i32;

/// Maximum length of a user's name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Inclusive lower bound for a user's age.
pub const MIN_AGE: i32 = 0;

/// Inclusive upper bound for a user's age.
pub const MAX_AGE: i32 = 150;

/// `chrono` format string for `created_at` / `updated_at` on the wire, e.g.
/// `2024-05-01 13:45:09 UTC`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";
