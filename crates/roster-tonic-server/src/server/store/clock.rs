use chrono::{DateTime, Utc};

/// Source of "now" for record timestamps.
///
/// The store only ever asks for the current UTC time; swapping the
/// implementation lets tests pin or advance time explicitly.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time via [`Utc::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
