//! In-memory user store.
//!
//! [`UserStore`] is the single authoritative owner of user records. It is
//! shared by every in-flight call behind an `Arc` and guarantees:
//!
//! - Ids come from one monotonically increasing counter and are never reused,
//!   even after deletion.
//! - Every operation is linearizable: mutations take the write lock for their
//!   whole check-then-act sequence, reads take the read lock.
//! - Updates swap in a new immutable record, so readers never observe a
//!   partially applied update.
//! - [`UserStore::list_all`] holds the lock only long enough to clone the
//!   record handles. Long-lived streams never block writers.

use super::{Clock, SystemClock, UserDraft, UserRecord};
use parking_lot::RwLock;
use portable_atomic::{AtomicI32, Ordering};
use roster_tonic_core::{Error, Result, types::UserId};
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct UserStore {
    // Keyed by id; ids only grow, so iteration order is insertion order.
    users: RwLock<BTreeMap<UserId, Arc<UserRecord>>>,
    last_id: AtomicI32,
    clock: Arc<dyn Clock>,
}

impl UserStore {
    /// Creates an empty store stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            last_id: AtomicI32::new(0),
            clock,
        }
    }

    /// Inserts a new record and returns it.
    ///
    /// The email uniqueness check and the insert run under one write lock, so
    /// two concurrent creates with the same email cannot both succeed.
    ///
    /// # Errors
    ///
    /// - [`Error::Conflict`] if an existing record already uses the email.
    /// - [`Error::Internal`] if the id space is exhausted.
    pub fn create(&self, draft: UserDraft) -> Result<Arc<UserRecord>> {
        let mut users = self.users.write();

        if Self::email_taken(&users, &draft.email, None) {
            return Err(Error::Conflict { email: draft.email });
        }

        let id = self.next_id()?;
        let record = Arc::new(UserRecord::create(id, draft, self.clock.now()));
        users.insert(id, Arc::clone(&record));
        Ok(record)
    }

    /// # Errors
    ///
    /// [`Error::NotFound`] if no record has this id.
    pub fn get(&self, id: UserId) -> Result<Arc<UserRecord>> {
        self.users
            .read()
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound { id })
    }

    /// Replaces all mutable fields of record `id` in one step and refreshes
    /// its `updated_at`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if no record has this id.
    /// - [`Error::Conflict`] if a different record already uses the email.
    ///
    /// The store is left untouched on error.
    pub fn update(&self, id: UserId, draft: UserDraft) -> Result<Arc<UserRecord>> {
        let mut users = self.users.write();

        let Some(current) = users.get(&id) else {
            return Err(Error::NotFound { id });
        };

        if Self::email_taken(&users, &draft.email, Some(id)) {
            return Err(Error::Conflict { email: draft.email });
        }

        let revised = Arc::new(current.revise(draft, self.clock.now()));
        users.insert(id, Arc::clone(&revised));
        Ok(revised)
    }

    /// Removes record `id`. Returns whether anything was removed.
    pub fn delete(&self, id: UserId) -> bool {
        self.users.write().remove(&id).is_some()
    }

    /// Point-in-time snapshot of every record, in ascending id order.
    pub fn list_all(&self) -> Vec<Arc<UserRecord>> {
        self.users.read().values().cloned().collect()
    }

    /// Whether any record other than `exclude` uses `email`
    /// (case-insensitive).
    pub fn email_exists(&self, email: &str, exclude: Option<UserId>) -> bool {
        Self::email_taken(&self.users.read(), email, exclude)
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    fn email_taken(
        users: &BTreeMap<UserId, Arc<UserRecord>>,
        email: &str,
        exclude: Option<UserId>,
    ) -> bool {
        users
            .values()
            .any(|user| Some(user.id) != exclude && user.email_matches(email))
    }

    fn next_id(&self) -> Result<UserId> {
        self.last_id
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                last.checked_add(1)
            })
            .map(|last| last + 1)
            .map_err(|_| Error::internal("user id space exhausted"))
    }

    #[cfg(test)]
    pub(crate) fn starting_after(last_id: UserId, clock: Arc<dyn Clock>) -> Self {
        let store = Self::with_clock(clock);
        store.last_id.store(last_id, Ordering::Release);
        store
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}
