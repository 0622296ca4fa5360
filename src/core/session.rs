//! Per-user conversation sessions.
//!
//! The outer map is only locked long enough to find or insert an entry. Each
//! entry has its own async mutex, held for the whole handling of one event, so
//! events from the same user are serialised while other users proceed in
//! parallel.

use crate::core::conversation::Step;
use chrono::TimeDelta;
use sea_orm::prelude::DateTimeUtc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Conversation state of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Where the user is in the conversation
    pub step: Step,
    /// Time of the last event from this user
    pub last_seen: DateTimeUtc,
}

impl Session {
    /// A fresh idle session.
    #[must_use]
    pub const fn new(now: DateTimeUtc) -> Self {
        Self {
            step: Step::Idle,
            last_seen: now,
        }
    }
}

/// Handle to one user's session.
pub type SharedSession = Arc<tokio::sync::Mutex<Session>>;

/// Concurrent map from user id to session, with idle expiry.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<u64, SharedSession>>,
    ttl: TimeDelta,
}

impl SessionStore {
    /// Creates an empty store whose sessions expire after `ttl` without events.
    #[must_use]
    pub fn new(ttl: TimeDelta) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the session of `user_id`, creating an idle one if needed.
    ///
    /// A session that has been idle for longer than the TTL is replaced by a
    /// fresh one, even if the periodic sweep has not run yet.
    pub fn get_or_create(&self, user_id: u64, now: DateTimeUtc) -> SharedSession {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = sessions
            .entry(user_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(Session::new(now))));

        if let Ok(mut session) = entry.try_lock() {
            if now - session.last_seen > self.ttl {
                debug!("Session of user {user_id} expired, starting over");
                *session = Session::new(now);
            }
        }
        Arc::clone(entry)
    }

    /// Returns the session of `user_id` if one is tracked.
    pub fn get(&self, user_id: u64) -> Option<SharedSession> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user_id)
            .map(Arc::clone)
    }

    /// Drops every session idle for longer than the TTL and returns how many
    /// were removed. Sessions currently being handled are kept.
    pub fn evict_expired(&self, now: DateTimeUtc) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(session) => now - session.last_seen <= self.ttl,
            Err(_) => true,
        });
        before - sessions.len()
    }

    /// Number of tracked sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// True when no session is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::{TimeZone, Utc};

    fn store() -> SessionStore {
        SessionStore::new(TimeDelta::minutes(30))
    }

    #[tokio::test]
    async fn test_same_user_gets_same_session() {
        let store = store();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        let first = store.get_or_create(1, now);
        first.lock().await.step = Step::AwaitingCategory;
        let again = store.get_or_create(1, now);
        assert_eq!(again.lock().await.step, Step::AwaitingCategory);

        let other = store.get_or_create(2, now);
        assert_eq!(other.lock().await.step, Step::Idle);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_evict_expired_removes_only_idle_sessions() {
        let store = store();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        store.get_or_create(1, start);
        let recent = store.get_or_create(2, start);
        recent.lock().await.last_seen = start + TimeDelta::minutes(20);

        let removed = store.evict_expired(start + TimeDelta::minutes(31));
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.evict_expired(start + TimeDelta::minutes(45)), 0);
    }

    #[tokio::test]
    async fn test_locked_sessions_are_not_evicted() {
        let store = store();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        let session = store.get_or_create(1, start);
        let _guard = session.lock().await;

        assert_eq!(store.evict_expired(start + TimeDelta::hours(5)), 0);
        assert!(!store.is_empty());
    }

    #[tokio::test]
    async fn test_expired_session_restarts_on_access() {
        let store = store();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

        let session = store.get_or_create(1, start);
        session.lock().await.step = Step::AwaitingCategory;

        let later = start + TimeDelta::hours(1);
        let session = store.get_or_create(1, later);
        let session = session.lock().await;
        assert_eq!(session.step, Step::Idle);
        assert_eq!(session.last_seen, later);
    }
}
