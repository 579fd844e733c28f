//! Management surface shared by every knowledge base.

use async_trait::async_trait;
use hoprag_core::error::SearchError;
use hoprag_core::{Passage, SimilaritySearch};

/// A searchable passage store that can also be filled and emptied.
#[async_trait]
pub trait KnowledgeStore: SimilaritySearch {
    /// Add passages, embedding them first if the store has an embedder.
    ///
    /// Returns how many passages were added.
    async fn add_passages(&self, passages: Vec<Passage>) -> Result<usize, SearchError>;

    /// Number of stored passages.
    async fn count(&self) -> Result<usize, SearchError>;

    /// Remove every passage.
    async fn clear(&self) -> Result<(), SearchError>;
}
