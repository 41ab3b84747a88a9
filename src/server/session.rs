//! Per-browser conversation sessions keyed by a cookie.
//!
//! Sessions are created only when a question is asked and are dropped once
//! they have been idle longer than the configured timeout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::services::ConversationSession;

pub const SESSION_COOKIE: &str = "cvbot_session";

pub type SharedSession = Arc<Mutex<ConversationSession>>;

struct SessionEntry {
    session: SharedSession,
    last_seen: Instant,
}

pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// The live session for `id`, refreshing its idle timer.
    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.get_at(id, Instant::now()).await
    }

    /// Store `session` under a fresh server-generated id.
    pub async fn insert(&self, session: ConversationSession) -> (Uuid, SharedSession) {
        self.insert_at(session, Instant::now()).await
    }

    async fn get_at(&self, id: Uuid, now: Instant) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        if now.saturating_duration_since(entry.last_seen) > self.idle_timeout {
            sessions.remove(&id);
            tracing::info!(session = %id, "conversation session expired");
            return None;
        }
        entry.last_seen = now;
        Some(entry.session.clone())
    }

    async fn insert_at(&self, session: ConversationSession, now: Instant) -> (Uuid, SharedSession) {
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= self.idle_timeout);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, "evicted idle conversation sessions");
        }

        let mut id = Uuid::new_v4();
        while sessions.contains_key(&id) {
            id = Uuid::new_v4();
        }

        let session = Arc::new(Mutex::new(session));
        sessions.insert(
            id,
            SessionEntry {
                session: session.clone(),
                last_seen: now,
            },
        );
        tracing::info!(session = %id, active = sessions.len(), "started conversation session");
        (id, session)
    }
}

/// Session id from the request's `Cookie` header, if present and well formed.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

pub fn session_cookie(id: Uuid) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ChatError, EmbeddingError};
    use crate::models::DocumentChunk;
    use crate::services::{ChatModel, PromptMessage, Retriever};
    use async_trait::async_trait;
    use axum::http::HeaderValue;

    struct SilentChat;

    #[async_trait]
    impl ChatModel for SilentChat {
        async fn complete(&self, _messages: &[PromptMessage]) -> Result<String, ChatError> {
            Ok(String::new())
        }

        fn model_name(&self) -> &str {
            "silent"
        }
    }

    struct NoContext;

    #[async_trait]
    impl Retriever for NoContext {
        async fn retrieve(&self, _query: &str) -> Result<Vec<DocumentChunk>, EmbeddingError> {
            Ok(Vec::new())
        }
    }

    fn conversation() -> ConversationSession {
        ConversationSession::new(Arc::new(SilentChat), Arc::new(NoContext))
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_stored() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert!(store.get(Uuid::new_v4()).await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_inserted_session_is_found_again() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (id, session) = store.insert(conversation()).await;
        let found = store.get(id).await.unwrap();
        assert!(Arc::ptr_eq(&session, &found));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let store = SessionStore::new(Duration::from_secs(60));
        let start = Instant::now();
        let (stale, _) = store.insert_at(conversation(), start).await;
        let (fresh, _) = store.insert_at(conversation(), start).await;

        let later = start + Duration::from_secs(30);
        assert!(store.get_at(fresh, later).await.is_some());

        // stale was last seen at `start`, fresh at `later`
        let much_later = start + Duration::from_secs(61);
        assert!(store.get_at(stale, much_later).await.is_none());
        assert!(store.get_at(fresh, much_later).await.is_some());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_insert_sweeps_idle_sessions() {
        let store = SessionStore::new(Duration::from_secs(60));
        let start = Instant::now();
        for _ in 0..5 {
            store.insert_at(conversation(), start).await;
        }
        assert_eq!(store.len().await, 5);

        store
            .insert_at(conversation(), start + Duration::from_secs(120))
            .await;
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_session_id_from_cookie_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={id}")).unwrap(),
        );
        assert_eq!(session_id(&headers), Some(id));
    }

    #[test]
    fn test_malformed_session_cookie_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("cvbot_session=not-a-uuid"));
        assert_eq!(session_id(&headers), None);
        assert_eq!(session_id(&HeaderMap::new()), None);
    }

    #[test]
    fn test_cookie_format() {
        let id = Uuid::nil();
        assert_eq!(
            session_cookie(id),
            "cvbot_session=00000000-0000-0000-0000-000000000000; Path=/; HttpOnly; SameSite=Lax"
        );
    }
}
