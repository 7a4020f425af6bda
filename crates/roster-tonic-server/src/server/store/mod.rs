//! Volatile, memory-resident storage for user records.
//!
//! - [`record`] - the immutable [`UserRecord`] value and the [`UserDraft`]
//!   carrying its mutable fields.
//! - [`clock`] - the [`Clock`] abstraction timestamps are read from.
//! - [`memory`] - [`UserStore`], the lock-guarded map shared by all calls.

pub mod clock;
pub mod memory;
pub mod record;

pub use clock::{Clock, SystemClock};
pub use memory::UserStore;
pub use record::{UserDraft, UserRecord};
