//! In-memory session storage backed by moka.

use std::time::Duration;

use moka::future::Cache;
use tracing::debug;
use uuid::Uuid;

use shopdash_core::config::SessionConfig;

use super::state::SessionState;

/// Concurrent session store with idle expiry.
#[derive(Debug, Clone)]
pub struct SessionStore {
    /// Sessions keyed by cookie identifier.
    cache: Cache<Uuid, SessionState>,
}

impl SessionStore {
    /// Creates a store sized and timed from configuration.
    pub fn new(config: &SessionConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_sessions)
            .time_to_idle(Duration::from_secs(config.idle_timeout_minutes * 60))
            .build();
        Self { cache }
    }

    /// Looks up a live session.
    pub async fn get(&self, id: Uuid) -> Option<SessionState> {
        self.cache.get(&id).await
    }

    /// Inserts or replaces a session.
    pub async fn put(&self, state: SessionState) {
        self.cache.insert(state.id, state).await;
    }

    /// Removes a session.
    pub async fn remove(&self, id: Uuid) {
        if self.cache.remove(&id).await.is_some() {
            debug!(session_id = %id, "Session removed");
        }
    }

    /// Returns the session for `id`, creating an empty one when it is
    /// missing or expired.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> SessionState {
        if let Some(id) = id {
            if let Some(state) = self.get(id).await {
                return state;
            }
        }
        let state = SessionState::new(Uuid::new_v4());
        debug!(session_id = %state.id, "Session created");
        self.put(state.clone()).await;
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig {
            cookie_name: "shopdash_session".into(),
            idle_timeout_minutes: 30,
            max_sessions: 100,
            secure_cookie: false,
        }
    }

    #[tokio::test]
    async fn test_unknown_id_gets_fresh_session() {
        let store = SessionStore::new(&config());
        let stale = Uuid::new_v4();

        let state = store.get_or_create(Some(stale)).await;
        assert_ne!(state.id, stale);
        assert!(store.get(state.id).await.is_some());
    }

    #[tokio::test]
    async fn test_known_id_is_reused() {
        let store = SessionStore::new(&config());
        let first = store.get_or_create(None).await;
        let again = store.get_or_create(Some(first.id)).await;
        assert_eq!(first.id, again.id);

        store.remove(first.id).await;
        assert!(store.get(first.id).await.is_none());
    }
}
