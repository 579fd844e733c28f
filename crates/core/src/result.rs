//! The terminal record of one orchestration run.

use serde::{Deserialize, Serialize};
use crate::analysis::Analysis;
use crate::evidence::EvidenceDocument;
use crate::plan::Plan;

/// Everything one query run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub user_query: String,

    pub plan: Plan,

    /// Always equal to `documents.len()`.
    pub total_documents: usize,

    /// Rounds executed, at least 1.
    pub iterations: u32,

    /// The last round's analysis; absent if no documents were ever found.
    #[serde(default)]
    pub analysis: Option<Analysis>,

    /// Every document retrieved, in retrieval order.
    #[serde(default)]
    pub documents: Vec<EvidenceDocument>,

    /// Set when the run was stopped at a round boundary.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

impl QueryResult {
    /// The final answer text, if any analysis ran.
    pub fn conclusion(&self) -> Option<&str> {
        self.analysis.as_ref().map(|a| a.conclusion.as_str())
    }

    /// The final confidence, or 0 when nothing was analyzed.
    pub fn confidence(&self) -> f32 {
        self.analysis.as_ref().map(|a| a.confidence).unwrap_or(0.0)
    }
}
