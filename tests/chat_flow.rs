use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use cvbot::error::{ChatError, EmbeddingError, LoadError};
use cvbot::models::{ChunkingConfig, Config, Role};
use cvbot::server::{AppState, router};
use cvbot::services::{
    ChatModel, ConversationSession, EmbeddingProvider, IndexRetriever, PageExtractor,
    PromptMessage, PromptRole, build_index,
};

/// Pages keyed by file stem.
struct StubExtractor;

impl PageExtractor for StubExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<String>, LoadError> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let page = match stem.as_str() {
            "cv" => "Worked as a software engineer in Stuttgart for five years. ",
            _ => "The reference letter praises reliability and team spirit. ",
        };
        Ok(vec![page.repeat(30)])
    }
}

/// Two-dimensional keyword embedding: [mentions work, mentions reference].
struct KeywordEmbeddings;

#[async_trait]
impl EmbeddingProvider for KeywordEmbeddings {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|t| {
                let t = t.to_lowercase();
                vec![
                    if t.contains("work") { 1.0 } else { 0.0 },
                    if t.contains("reference") { 1.0 } else { 0.0 },
                ]
            })
            .collect())
    }
}

/// Answers with the closest retrieved chunk.
#[derive(Default)]
struct EchoChat {
    calls: AtomicUsize,
}

#[async_trait]
impl ChatModel for EchoChat {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let system = messages.iter().find(|m| m.role == PromptRole::System);
        match system {
            Some(m) => Ok(m
                .content
                .split("----------------\n")
                .nth(1)
                .and_then(|context| context.lines().next())
                .unwrap_or_default()
                .to_string()),
            None => Ok("Where did he work?".to_string()),
        }
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

async fn backend() -> (Arc<EchoChat>, Arc<IndexRetriever>, usize) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("cv.pdf"), b"%PDF").unwrap();
    std::fs::write(dir.path().join("reference.pdf"), b"%PDF").unwrap();

    let embeddings = Arc::new(KeywordEmbeddings);
    let (index, stats) = build_index(
        dir.path(),
        &ChunkingConfig::default(),
        &StubExtractor,
        embeddings.as_ref(),
        false,
    )
    .await
    .unwrap();

    assert_eq!(stats.files.len(), 2);
    assert!(stats.longest_chunk <= 1200);

    let retriever = Arc::new(IndexRetriever::new(Arc::new(index), embeddings, 4));
    (Arc::new(EchoChat::default()), retriever, stats.chunks_created)
}

#[tokio::test]
async fn test_terminal_session_answers_from_documents() {
    let (chat, retriever, _) = backend().await;
    let mut session = ConversationSession::new(chat.clone(), retriever);

    let history = session.ask("Where did he work?").await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[1].content.contains("Stuttgart"));

    let history = session.ask("And what do the references say?").await.unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[2].role, Role::Human);
    assert_eq!(history[3].role, Role::Ai);

    // one answer, then condense + answer
    assert_eq!(chat.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_web_session_keeps_transcript_between_requests() {
    let (chat, retriever, chunks) = backend().await;
    let state = AppState::new(Config::default(), chat, retriever, chunks);
    let app = router(state);

    let first = app
        .clone()
        .oneshot(
            Request::post("/")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("question=Where+did+he+work%3F"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let cookie = first.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let page = app
        .oneshot(
            Request::get("/")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(page.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(html.contains("Where did he work?"));
    assert!(html.contains("Stuttgart"));
    assert_eq!(html.matches("chat-message user").count(), 1);
    assert_eq!(html.matches("chat-message bot").count(), 1);
}
