//! Embedding client used by the knowledge bases.

use std::sync::Arc;

use hoprag_core::error::SearchError;
use hoprag_core::provider::{EmbeddingRequest, Provider};
use tracing::debug;

const BATCH_SIZE: usize = 32;

/// A provider plus the embedding model to ask it for.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn Provider>,
    model: String,
}

impl Embedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Embed `texts` in batches, one vector per input, in input order.
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SearchError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            debug!(provider = %self.provider.name(), model = %self.model, count = batch.len(), "Embedding batch");
            let response = self
                .provider
                .embed(EmbeddingRequest {
                    model: self.model.clone(),
                    inputs: batch.to_vec(),
                })
                .await
                .map_err(|e| SearchError::EmbeddingFailed(e.to_string()))?;

            if response.embeddings.len() != batch.len() {
                return Err(SearchError::EmbeddingFailed(format!(
                    "expected {} vectors, got {}",
                    batch.len(),
                    response.embeddings.len()
                )));
            }
            vectors.extend(response.embeddings);
        }
        Ok(vectors)
    }

    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, SearchError> {
        self.embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| SearchError::EmbeddingFailed("empty embedding response".into()))
    }
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::KeywordEmbedder;
    use super::*;

    #[tokio::test]
    async fn embeds_in_input_order_across_batches() {
        let embedder = Embedder::new(Arc::new(KeywordEmbedder), "test");
        let mut texts: Vec<String> = (0..40).map(|i| format!("第{i}段")).collect();
        texts[35] = "星辰项目".into();
        let vectors = embedder.embed(&texts).await.unwrap();
        assert_eq!(vectors.len(), 40);
        assert_eq!(vectors[35], vec![0.0, 0.0, 1.0]);
    }

    #[tokio::test]
    async fn unsupported_provider_is_embedding_error() {
        struct NoEmbed;
        #[async_trait::async_trait]
        impl Provider for NoEmbed {
            fn name(&self) -> &str {
                "none"
            }
            async fn complete(
                &self,
                _request: hoprag_core::ProviderRequest,
            ) -> Result<hoprag_core::ProviderResponse, hoprag_core::ProviderError> {
                Err(hoprag_core::ProviderError::NotConfigured("x".into()))
            }
        }
        let embedder = Embedder::new(Arc::new(NoEmbed), "m");
        let err = embedder.embed_one("张三").await.unwrap_err();
        assert!(matches!(err, SearchError::EmbeddingFailed(_)));
    }
}
