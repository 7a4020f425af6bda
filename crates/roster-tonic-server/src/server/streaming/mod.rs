//! Server-streaming support for `ListUsers`.
//!
//! - [`enumerator`] - selects records from a store snapshot and feeds them to
//!   the response channel one at a time, stopping on cancellation.

pub mod enumerator;
