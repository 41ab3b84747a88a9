use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const LOCAL_CONFIG_FILE: &str = "cvbot.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub documents: DocumentsConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub page: PageConfig,
}

/// A config together with the file it was read from, if any.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub path: Option<PathBuf>,
}

impl Config {
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cvbot").join("config.toml"))
    }

    pub fn local_path() -> PathBuf {
        PathBuf::from(LOCAL_CONFIG_FILE)
    }

    /// Candidate paths in lookup order.
    pub fn search_paths(explicit: Option<&Path>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Some(path) = explicit {
            paths.push(path.to_path_buf());
        }
        paths.push(Self::local_path());
        if let Some(global) = Self::global_path() {
            paths.push(global);
        }
        paths
    }

    /// Load the first config file that exists, or defaults.
    ///
    /// An explicitly requested path must exist.
    pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
        if let Some(path) = explicit
            && !path.exists()
        {
            return Err(ConfigError::PathError(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        for path in Self::search_paths(explicit) {
            if path.exists() {
                let config = Self::from_file(&path)?;
                return Ok(LoadedConfig {
                    config,
                    path: Some(path),
                });
            }
        }

        Ok(LoadedConfig {
            config: Self::default(),
            path: None,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "chunking.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.batch_size must be greater than zero".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.top_k must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(ConfigError::ValidationError(
                "chat.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }
        if self.server.session_idle_secs == 0 {
            return Err(ConfigError::ValidationError(
                "server.session_idle_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read the API key from the environment. `.env` is loaded by the binary.
pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,

    #[serde(default = "default_user_avatar")]
    pub user_avatar: PathBuf,

    #[serde(default = "default_bot_avatar")]
    pub bot_avatar: PathBuf,

    #[serde(default = "default_portrait")]
    pub portrait: PathBuf,

    #[serde(default = "default_diagram")]
    pub diagram: PathBuf,
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("data/docs")
}

fn default_user_avatar() -> PathBuf {
    PathBuf::from("data/images/question.png")
}

fn default_bot_avatar() -> PathBuf {
    PathBuf::from("data/images/bot.png")
}

fn default_portrait() -> PathBuf {
    PathBuf::from("data/images/portrait.jpg")
}

fn default_diagram() -> PathBuf {
    PathBuf::from("data/diagrams/structure.png")
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            user_avatar: default_user_avatar(),
            bot_avatar: default_bot_avatar(),
            portrait: default_portrait(),
            diagram: default_diagram(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    1200
}

fn default_chunk_overlap() -> usize {
    400
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries after the first attempt for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    DEFAULT_OPENAI_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_batch_size() -> u32 {
    100
}

fn default_timeout() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_embedding_model(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Retries after the first attempt for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_chat_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Cap on the turns fed to the question-condensing prompt. Unset keeps all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_history_turns: Option<usize>,
}

fn default_top_k() -> usize {
    4
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_history_turns: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Seconds a browser session may stay idle before it is dropped.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_session_idle_secs() -> u64 {
    3600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_header")]
    pub header: String,

    #[serde(default = "default_intro")]
    pub intro: String,

    #[serde(default = "default_sources")]
    pub sources: Vec<String>,

    #[serde(default = "default_language_note")]
    pub language_note: String,

    #[serde(default = "default_input_label")]
    pub input_label: String,

    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
}

fn default_title() -> String {
    "Chat with me!".to_string()
}

fn default_header() -> String {
    "Chat with me!".to_string()
}

fn default_intro() -> String {
    "This is a simple bot to ask some questions about me. The answers will be provided based on my:"
        .to_string()
}

fn default_sources() -> Vec<String> {
    vec!["CV".to_string(), "working references".to_string()]
}

fn default_language_note() -> String {
    "Feel free to use your preferred language!".to_string()
}

fn default_input_label() -> String {
    "Ask a question about me!".to_string()
}

fn default_placeholder() -> String {
    "Was he any good during his employments?".to_string()
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            header: default_header(),
            intro: default_intro(),
            sources: default_sources(),
            language_note: default_language_note(),
            input_label: default_input_label(),
            placeholder: default_placeholder(),
            repo_url: None,
        }
    }
}
