//! File-based knowledge base — persistent JSON-lines storage.
//!
//! Each line is a JSON-encoded [`KnowledgeEntry`]. Entries are loaded into
//! memory on open and the whole file is rewritten on every mutation, so
//! reads are fast and writes are durable.
//!
//! Storage location: `~/.hoprag/knowledge.jsonl` unless configured.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hoprag_core::error::SearchError;
use hoprag_core::{Passage, SimilaritySearch};
use tracing::{debug, warn};

use crate::embedder::Embedder;
use crate::entry::KnowledgeEntry;
use crate::in_memory::InMemoryKnowledgeBase;
use crate::store::KnowledgeStore;

/// A knowledge base backed by a JSONL file.
pub struct FileKnowledgeBase {
    path: PathBuf,
    inner: InMemoryKnowledgeBase,
}

impl FileKnowledgeBase {
    /// Open the knowledge base at `path`.
    ///
    /// A missing file starts empty (created on first write). Corrupted
    /// lines are skipped with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_from_disk(&path);
        debug!(path = %path.display(), count = entries.len(), "Knowledge file loaded");
        Self {
            path,
            inner: InMemoryKnowledgeBase::from_entries(entries),
        }
    }

    pub fn with_embedder(mut self, embedder: Embedder) -> Self {
        self.inner = self.inner.with_embedder(embedder);
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.inner = self.inner.with_max_results(max_results);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write all entries to disk as JSONL.
    async fn flush(&self) -> Result<(), SearchError> {
        let entries = self.inner.snapshot().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SearchError::Storage(format!("Failed to create knowledge directory: {e}"))
            })?;
        }

        let mut content = String::new();
        for entry in &entries {
            let line = serde_json::to_string(entry).map_err(|e| {
                SearchError::Storage(format!("Failed to serialize knowledge entry: {e}"))
            })?;
            content.push_str(&line);
            content.push('\n');
        }

        std::fs::write(&self.path, &content).map_err(|e| {
            SearchError::Storage(format!("Failed to write knowledge file: {e}"))
        })?;

        Ok(())
    }
}

fn load_from_disk(path: &Path) -> Vec<KnowledgeEntry> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(n, line)| match serde_json::from_str::<KnowledgeEntry>(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(line = n + 1, error = %e, "Skipping corrupted knowledge entry");
                None
            }
        })
        .collect()
}

#[async_trait]
impl SimilaritySearch for FileKnowledgeBase {
    fn name(&self) -> &str {
        "file"
    }

    async fn search(&self, query: &str, threshold: f32) -> Result<Vec<Passage>, SearchError> {
        self.inner.search(query, threshold).await
    }
}

#[async_trait]
impl KnowledgeStore for FileKnowledgeBase {
    async fn add_passages(&self, passages: Vec<Passage>) -> Result<usize, SearchError> {
        let added = self.inner.add_passages(passages).await?;
        if added > 0 {
            self.flush().await?;
        }
        Ok(added)
    }

    async fn count(&self) -> Result<usize, SearchError> {
        self.inner.count().await
    }

    async fn clear(&self) -> Result<(), SearchError> {
        self.inner.clear().await?;
        self.flush().await
    }
}
