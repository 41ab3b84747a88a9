//! HTTP front end: renders the chat page and routes questions into
//! per-browser conversation sessions.

pub mod protocol;
pub mod render;
pub mod session;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Form, State};
use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::models::{ChatMessage, Config};
use crate::server::protocol::{HealthResponse, QuestionForm};
use crate::server::render::{PageView, render_page};
use crate::server::session::{SessionStore, SharedSession, session_cookie, session_id};
use crate::services::{ChatModel, ConversationSession, Retriever};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Shared>,
}

struct Shared {
    config: Config,
    chat: Arc<dyn ChatModel>,
    retriever: Arc<dyn Retriever>,
    indexed_chunks: usize,
    sessions: SessionStore,
}

impl AppState {
    pub fn new(
        config: Config,
        chat: Arc<dyn ChatModel>,
        retriever: Arc<dyn Retriever>,
        indexed_chunks: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Shared {
                chat,
                retriever,
                indexed_chunks,
                sessions: SessionStore::new(Duration::from_secs(
                    config.server.session_idle_secs,
                )),
                config,
            }),
        }
    }

    fn new_conversation(&self) -> ConversationSession {
        ConversationSession::new(self.inner.chat.clone(), self.inner.retriever.clone())
            .with_max_history_turns(self.inner.config.retrieval.max_history_turns)
    }

    /// The stored session named by the request cookie, if it is still live.
    async fn existing_session(&self, headers: &HeaderMap) -> Option<SharedSession> {
        let id = session_id(headers)?;
        self.inner.sessions.get(id).await
    }

    /// Session to ask in, plus a `Set-Cookie` value when a new one was stored.
    async fn session_for_question(&self, headers: &HeaderMap) -> (SharedSession, Option<String>) {
        if let Some(session) = self.existing_session(headers).await {
            return (session, None);
        }
        let (id, session) = self.inner.sessions.insert(self.new_conversation()).await;
        (session, Some(session_cookie(id)))
    }

    fn page(&self, history: &[ChatMessage], error: Option<&str>) -> String {
        render_page(
            &self.inner.config.page,
            &self.inner.config.documents,
            &PageView { history, error },
        )
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(show_page).post(ask_question))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn show_page(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let html = match state.existing_session(&headers).await {
        Some(session) => state.page(session.lock().await.history(), None),
        None => state.page(&[], None),
    };
    Html(html)
}

async fn ask_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<QuestionForm>,
) -> Response {
    let Some(question) = form.question() else {
        return show_page(State(state), headers).await.into_response();
    };

    let (session, cookie) = state.session_for_question(&headers).await;
    let mut conversation = session.lock().await;

    let html = match conversation.ask(question).await {
        Ok(history) => state.page(history, None),
        Err(e) => {
            tracing::error!(error = %e, "failed to answer question");
            let message = format!("Sorry, the question could not be answered: {e}");
            state.page(conversation.history(), Some(&message))
        }
    };
    with_cookie(html, cookie)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        chunks: state.inner.indexed_chunks,
        sessions: state.inner.sessions.len().await,
        chat_model: state.inner.chat.model_name().to_string(),
    })
}

fn with_cookie(html: String, cookie: Option<String>) -> Response {
    match cookie {
        Some(cookie) => ([(SET_COOKIE, cookie)], Html(html)).into_response(),
        None => Html(html).into_response(),
    }
}

/// Serve the chat page until Ctrl+C or SIGTERM.
pub async fn run_server(state: AppState, bind: &str) -> Result<(), std::io::Error> {
    let addr: SocketAddr = bind.parse().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid bind address {bind}: {e}"),
        )
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "chat page listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(crate::shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}
