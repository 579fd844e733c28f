//! Similarity search trait — the retrieval capability.
//!
//! Given a query string and a threshold in `[0, 1]`, a backend returns the
//! passages it considers relevant, best first. The retriever relies only on
//! this contract; how passages are scored is the backend's business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::SearchError;

/// Provenance tags attached to a passage (e.g. `source`, `type`, `similarity`).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A single passage returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// The passage text
    pub content: String,

    /// Origin/provenance tags
    #[serde(default)]
    pub metadata: Metadata,
}

impl Passage {
    /// Create a passage with no metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    /// Attach a metadata tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// The core SimilaritySearch trait.
///
/// Implementations must be idempotent for identical `(query, threshold)`
/// within one session. Implementations: in-memory, JSONL file.
#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    /// The backend name (e.g., "in_memory", "file").
    fn name(&self) -> &str;

    /// Return passages scoring at least `threshold`, ordered best first.
    async fn search(&self, query: &str, threshold: f32) -> std::result::Result<Vec<Passage>, SearchError>;
}
