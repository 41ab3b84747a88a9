mod chat;
mod config;
mod document;
mod search;

pub use chat::{ChatMessage, ChatTurn, Role, turns};
pub use config::{
    API_KEY_ENV, ChatConfig, ChunkingConfig, Config, DEFAULT_BIND, DEFAULT_CHAT_MODEL,
    DEFAULT_EMBEDDING_MODEL, DEFAULT_OPENAI_URL, DocumentsConfig, EmbeddingConfig, LoadedConfig,
    PageConfig, RetrievalConfig, ServerConfig, api_key_from_env,
};
pub use document::{Document, DocumentChunk};
pub use search::{OutputFormat, SearchHit};
