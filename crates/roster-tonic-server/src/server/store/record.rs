use chrono::{DateTime, Utc};
use roster_tonic_core::types::UserId;

/// The mutable fields of a user, as supplied by a create or update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub age: i32,
}

/// A stored user.
///
/// Records are never modified in place. An update builds a new value and
/// swaps it into the store, so a reader holding an older `Arc<UserRecord>`
/// keeps seeing a complete, consistent version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub(crate) fn create(id: UserId, draft: UserDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            email: draft.email,
            age: draft.age,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the next version of this record with `draft` applied.
    ///
    /// `updated_at` always moves strictly forward, even when the clock
    /// reports a time at or before the previous version.
    pub(crate) fn revise(&self, draft: UserDraft, now: DateTime<Utc>) -> Self {
        let floor = self.updated_at + chrono::TimeDelta::microseconds(1);
        Self {
            id: self.id,
            name: draft.name,
            email: draft.email,
            age: draft.age,
            created_at: self.created_at,
            updated_at: now.max(floor),
        }
    }

    pub fn email_matches(&self, email: &str) -> bool {
        self.email.to_lowercase() == email.to_lowercase()
    }

    /// Case-insensitive substring match on name or email. `needle` must
    /// already be lowercased.
    pub fn matches_filter(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.email.to_lowercase().contains(needle)
    }
}
