//! The stored unit of a knowledge base.

use chrono::{DateTime, Utc};
use hoprag_core::{Metadata, Passage};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One passage as persisted, with its optional embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,

    pub content: String,

    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    pub created_at: DateTime<Utc>,
}

impl KnowledgeEntry {
    pub fn from_passage(passage: Passage, embedding: Option<Vec<f32>>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: passage.content,
            metadata: passage.metadata,
            embedding,
            created_at: Utc::now(),
        }
    }

    /// A search hit: the passage with its score recorded as `similarity`.
    pub fn to_passage(&self, similarity: f32) -> Passage {
        let mut metadata = self.metadata.clone();
        metadata.insert("similarity".into(), serde_json::json!(round_score(similarity)));
        Passage {
            content: self.content.clone(),
            metadata,
        }
    }
}

fn round_score(score: f32) -> f64 {
    (score as f64 * 10_000.0).round() / 10_000.0
}
