//! In-memory knowledge base — useful for testing and ephemeral sessions.

use std::sync::Arc;

use async_trait::async_trait;
use hoprag_core::error::SearchError;
use hoprag_core::{Passage, SimilaritySearch};
use tokio::sync::RwLock;
use tracing::debug;

use crate::embedder::Embedder;
use crate::entry::KnowledgeEntry;
use crate::scoring::rank_entries;
use crate::store::KnowledgeStore;

/// Passages returned per search unless configured otherwise.
pub const DEFAULT_MAX_RESULTS: usize = 3;

/// A knowledge base that keeps every entry in a Vec.
pub struct InMemoryKnowledgeBase {
    entries: Arc<RwLock<Vec<KnowledgeEntry>>>,
    embedder: Option<Embedder>,
    max_results: usize,
}

impl InMemoryKnowledgeBase {
    pub fn new() -> Self {
        Self::from_entries(Vec::new())
    }

    pub(crate) fn from_entries(entries: Vec<KnowledgeEntry>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
            embedder: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Score with embeddings from this embedder instead of lexically.
    pub fn with_embedder(mut self, embedder: Embedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Cap the number of passages a search returns (at least 1).
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub(crate) async fn snapshot(&self) -> Vec<KnowledgeEntry> {
        self.entries.read().await.clone()
    }

    async fn to_entries(&self, passages: Vec<Passage>) -> Result<Vec<KnowledgeEntry>, SearchError> {
        let embeddings = match &self.embedder {
            Some(embedder) => {
                let texts: Vec<String> = passages.iter().map(|p| p.content.clone()).collect();
                embedder.embed(&texts).await?.into_iter().map(Some).collect()
            }
            None => vec![None; passages.len()],
        };
        Ok(passages
            .into_iter()
            .zip(embeddings)
            .map(|(passage, embedding)| KnowledgeEntry::from_passage(passage, embedding))
            .collect())
    }
}

impl Default for InMemoryKnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SimilaritySearch for InMemoryKnowledgeBase {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn search(&self, query: &str, threshold: f32) -> Result<Vec<Passage>, SearchError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(SearchError::QueryFailed(format!(
                "threshold {threshold} is outside [0.0, 1.0]"
            )));
        }
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = match &self.embedder {
            Some(embedder) => Some(embedder.embed_one(query).await?),
            None => None,
        };

        let entries = self.entries.read().await;
        let results = rank_entries(
            &entries,
            query,
            query_embedding.as_deref(),
            threshold,
            self.max_results,
        );
        debug!(query, threshold, hits = results.len(), "Knowledge search");
        Ok(results)
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeBase {
    async fn add_passages(&self, passages: Vec<Passage>) -> Result<usize, SearchError> {
        let passages: Vec<Passage> = passages
            .into_iter()
            .filter(|p| !p.content.trim().is_empty())
            .collect();
        let entries = self.to_entries(passages).await?;
        let added = entries.len();
        self.entries.write().await.extend(entries);
        Ok(added)
    }

    async fn count(&self) -> Result<usize, SearchError> {
        Ok(self.entries.read().await.len())
    }

    async fn clear(&self) -> Result<(), SearchError> {
        self.entries.write().await.clear();
        Ok(())
    }
}
