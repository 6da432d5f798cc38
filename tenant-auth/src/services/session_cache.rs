//! In-process `token -> Session` map shared by the gate and the services.
//!
//! Request paths never insert blindly. Every eviction bumps a generation
//! counter; an insert made from data read before an eviction is rolled back,
//! so a revoked token cannot reappear once its user has been invalidated.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::models::{Session, User};

/// Sharded session cache. Clones share the same map.
#[derive(Clone, Default)]
pub struct SessionCache {
    sessions: Arc<DashMap<String, Session>>,
    generation: Arc<AtomicU64>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached session for `token`. Never touches storage.
    pub fn get(&self, token: &str) -> Option<Session> {
        let session = self.sessions.get(token).map(|entry| entry.value().clone());
        if session.is_some() {
            metrics::counter!("session_cache_hits_total").increment(1);
        } else {
            metrics::counter!("session_cache_misses_total").increment(1);
        }
        session
    }

    /// Current invalidation generation. Take it before reading the store.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Unconditional insert, for warm-up only.
    pub fn put(&self, token: impl Into<String>, session: Session) {
        self.sessions.insert(token.into(), session);
    }

    /// Insert `session` unless an invalidation happened after `seen` was
    /// observed. Returns whether the entry stayed cached.
    ///
    /// The entry is inserted first and rolled back on a generation change;
    /// an invalidation that lands after the check removes it itself.
    pub fn put_if_current(&self, token: impl Into<String>, session: Session, seen: u64) -> bool {
        let token = token.into();
        let user_id = session.user_id;
        self.sessions.insert(token.clone(), session);

        if self.generation() == seen {
            return true;
        }
        self.sessions
            .remove_if(&token, |_, cached| cached.user_id == user_id);
        tracing::debug!(user_id, "Discarded session cached across an invalidation");
        false
    }

    /// Apply `update` to the entry for `token` if it is still cached. Never
    /// creates an entry.
    pub fn update_if_present(&self, token: &str, update: impl FnOnce(&mut Session)) -> bool {
        match self.sessions.get_mut(token) {
            Some(mut entry) => {
                update(entry.value_mut());
                true
            }
            None => false,
        }
    }

    /// Drop every entry belonging to `user_id`.
    pub fn invalidate_by_user(&self, user_id: i32) -> usize {
        self.generation.fetch_add(1, Ordering::SeqCst);

        let mut removed = 0;
        self.sessions.retain(|_, session| {
            let keep = session.user_id != user_id;
            if !keep {
                removed += 1;
            }
            keep
        });
        if removed > 0 {
            tracing::debug!(user_id, removed, "Invalidated cached sessions");
        }
        removed
    }

    /// Populate from users that already hold a token.
    pub fn preload(&self, users: &[User]) -> usize {
        let mut loaded = 0;
        for user in users {
            if let Some(token) = &user.token {
                self.put(token.clone(), Session::from_user(user, token.clone()));
                loaded += 1;
            }
        }
        loaded
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
