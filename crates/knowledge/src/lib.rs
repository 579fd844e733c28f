//! Knowledge bases for HopRAG.
//!
//! Every backend implements `hoprag_core::SimilaritySearch` so the
//! retriever can use it, and [`KnowledgeStore`] so the front end can fill
//! and empty it.

pub mod demo;
pub mod embedder;
pub mod entry;
pub mod file_backend;
pub mod in_memory;
pub mod loader;
pub mod scoring;
pub mod store;

pub use demo::{DEMO_QUESTIONS, demo_passages};
pub use embedder::Embedder;
pub use entry::KnowledgeEntry;
pub use file_backend::FileKnowledgeBase;
pub use in_memory::InMemoryKnowledgeBase;
pub use loader::{ChunkSettings, load_path, split_text};
pub use scoring::{cosine_similarity, lexical_similarity};
pub use store::KnowledgeStore;
