use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{error::Result, session::Session};

/// Shared, lockable handle to one user's session. Holding the lock is what
/// serializes messages from the same user.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Trait for storing and retrieving sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Fetch the user's session, creating a fresh one if there is none.
    async fn get_or_create(&self, user_id: &str) -> Result<SessionHandle>;
    async fn get(&self, user_id: &str) -> Result<Option<SessionHandle>>;
    async fn delete(&self, user_id: &str) -> Result<()>;
    /// Drop sessions idle for longer than `max_idle`, returning how many went.
    async fn evict_idle(&self, max_idle: Duration) -> Result<usize>;
    async fn len(&self) -> usize;
}

/// In-memory implementation of SessionStorage. Sessions live for the life of
/// the process unless deleted or evicted.
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, SessionHandle>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn get_or_create(&self, user_id: &str) -> Result<SessionHandle> {
        let handle = self
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| {
                debug!(user_id = %user_id, "Creating new session");
                Arc::new(Mutex::new(Session::new(user_id)))
            })
            .clone();
        Ok(handle)
    }

    async fn get(&self, user_id: &str) -> Result<Option<SessionHandle>> {
        Ok(self.sessions.get(user_id).map(|entry| entry.clone()))
    }

    async fn delete(&self, user_id: &str) -> Result<()> {
        self.sessions.remove(user_id);
        Ok(())
    }

    async fn evict_idle(&self, max_idle: Duration) -> Result<usize> {
        let cutoff = Utc::now() - max_idle;
        let before = self.sessions.len();
        // A session whose lock is held is mid-turn, so it is not idle.
        self.sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => !session.is_idle_since(cutoff),
            Err(_) => true,
        });
        Ok(before.saturating_sub(self.sessions.len()))
    }

    async fn len(&self) -> usize {
        self.sessions.len()
    }
}
