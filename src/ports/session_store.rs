//! Session Store Port - scoped, lockable access to per-user sessions.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::foundation::UserId;
use crate::domain::session::Session;

/// Shared handle to one user's session.
///
/// Handlers hold the mutex for the duration of one message's processing;
/// that is what serializes concurrent requests for the same user. Different
/// users' sessions are independent.
pub type SessionRef = Arc<Mutex<Session>>;

/// Errors that can occur during session store operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Session store is unavailable: {0}")]
    Unavailable(String),
}

/// Port for per-user conversation state with bounded lifetime.
///
/// A missing session is never an error: `get_or_create` transparently
/// starts a fresh one. Implementations evict entries idle past their TTL,
/// but never an entry whose mutex is currently held.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the session for a user, creating it on first contact.
    async fn get_or_create(&self, user_id: &UserId) -> Result<SessionRef, SessionStoreError>;

    /// Returns the session for a user if one exists.
    async fn get(&self, user_id: &UserId) -> Result<Option<SessionRef>, SessionStoreError>;

    /// Drops a user's session. Returns true if one existed.
    async fn remove(&self, user_id: &UserId) -> Result<bool, SessionStoreError>;

    /// Number of live sessions.
    async fn len(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_error_displays_reason() {
        let err = SessionStoreError::Unavailable("backing map poisoned".to_string());
        assert!(err.to_string().contains("backing map poisoned"));
    }
}
