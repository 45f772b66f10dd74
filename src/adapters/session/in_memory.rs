//! In-memory session store with TTL eviction.
//!
//! One entry per user, each behind its own `tokio::sync::Mutex`; handlers
//! hold that mutex for a whole turn, which serializes concurrent requests
//! for the same user. The background sweep only removes entries that are
//! idle past the TTL and not currently locked, so eviction can never race
//! an in-flight mutation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::domain::catalog::{Catalog, FlowId};
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::session::Session;
use crate::ports::{SessionRef, SessionStore, SessionStoreError};

/// In-memory session store for single-server deployments.
pub struct InMemorySessionStore {
    catalog: Arc<Catalog>,
    sessions: RwLock<HashMap<UserId, SessionRef>>,
}

impl InMemorySessionStore {
    /// Creates an empty store. New sessions start in the catalog's initial
    /// flow.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Removes sessions idle longer than `ttl`.
    ///
    /// A session whose mutex is currently held is in the middle of a turn
    /// and is skipped regardless of its idle clock. Returns the number of
    /// evicted sessions.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let now = Timestamp::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|user_id, entry| match entry.try_lock() {
            Ok(session) => {
                let keep = session.idle_secs(&now) < ttl.as_secs();
                if !keep {
                    tracing::debug!(user = %user_id, "evicting idle session");
                }
                keep
            }
            // Locked means a turn is being processed right now.
            Err(_) => true,
        });

        before - sessions.len()
    }

    /// Spawns the background TTL sweep.
    pub fn spawn_sweeper(store: Arc<Self>, ttl: Duration, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let evicted = store.evict_idle(ttl).await;
                if evicted > 0 {
                    tracing::info!(evicted, "session sweep complete");
                }
            }
        })
    }

    fn fresh_session(&self, user_id: &UserId) -> Session {
        Session::new(
            user_id.clone(),
            FlowId::Initial,
            self.catalog.initial_flow().nodes.clone(),
        )
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, user_id: &UserId) -> Result<SessionRef, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .entry(user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(self.fresh_session(user_id))));
        Ok(entry.clone())
    }

    async fn get(&self, user_id: &UserId) -> Result<Option<SessionRef>, SessionStoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(user_id).cloned())
    }

    async fn remove(&self, user_id: &UserId) -> Result<bool, SessionStoreError> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(user_id).is_some())
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
