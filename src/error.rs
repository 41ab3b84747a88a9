//! Error types for the portfolio chatbot.

use reqwest::StatusCode;
use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors raised while reading documents from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("directory walk error: {0}")]
    WalkError(String),

    #[error("failed to extract text from {path}: {message}")]
    ExtractError { path: String, message: String },

    #[error("no PDF documents found in {0}")]
    NoDocuments(String),
}

/// Errors related to chunker settings.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("chunk size must be greater than zero")]
    ZeroChunkSize,

    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding API: {0}")]
    ConnectionError(String),

    #[error("embedding API error: status {status}: {body}")]
    ServerError { status: StatusCode, body: String },

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,

    #[error("missing API key (set OPENAI_API_KEY)")]
    MissingApiKey,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            EmbeddingError::ServerError { status, .. } => is_transient_status(*status),
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            EmbeddingError::InvalidResponse(_) | EmbeddingError::MissingApiKey => false,
        }
    }
}

/// Errors related to building or querying the in-memory index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("embedding error: {0}")]
    EmbeddingError(#[from] EmbeddingError),

    #[error("expected {expected} vectors, got {actual}")]
    VectorCountMismatch { expected: usize, actual: usize },

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("no chunks to index")]
    Empty,
}

/// Errors related to the chat-completion API.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to connect to chat API: {0}")]
    ConnectionError(String),

    #[error("chat API error: status {status}: {body}")]
    ServerError { status: StatusCode, body: String },

    #[error("chat request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid chat response: {0}")]
    InvalidResponse(String),

    #[error("chat timeout")]
    Timeout,

    #[error("missing API key (set OPENAI_API_KEY)")]
    MissingApiKey,
}

impl Retryable for ChatError {
    fn is_retryable(&self) -> bool {
        match self {
            ChatError::ConnectionError(_) | ChatError::Timeout => true,
            ChatError::ServerError { status, .. } => is_transient_status(*status),
            ChatError::RequestError(e) => e.is_timeout() || e.is_connect(),
            ChatError::InvalidResponse(_) | ChatError::MissingApiKey => false,
        }
    }
}

/// Errors raised while answering a question.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("question is empty")]
    EmptyQuestion,

    #[error("chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("retrieval error: {0}")]
    Retrieval(#[from] EmbeddingError),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("chunk error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("conversation error: {0}")]
    Conversation(#[from] ConversationError),
}

/// Rate limiting and server-side failures are worth another attempt.
fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
