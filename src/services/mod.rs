pub mod chat;
pub mod chunker;
pub mod conversation;
pub mod embedding;
pub mod loader;
pub mod pipeline;
pub mod vector_store;

pub use chat::{ChatModel, OpenAiChat, PromptMessage, PromptRole};
pub use chunker::{DEFAULT_SEPARATORS, TextChunker};
pub use conversation::ConversationSession;
pub use embedding::{EmbeddingProvider, OpenAiEmbeddings};
pub use loader::{PageExtractor, PdfExtractor, list_documents, load_pdf_text, read_documents};
pub use pipeline::{IndexStats, build_index, prepare_chunks};
pub use vector_store::{IndexRetriever, Retriever, VectorIndex};
