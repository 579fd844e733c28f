//! Evidence documents — retrieved passages tagged with how they were found.

use serde::{Deserialize, Serialize};
use crate::search::{Metadata, Passage};

/// Which retrieval produced a document: a plan step, or an expansion search.
///
/// Serialized as the step number or the literal string `"expansion"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawStep", into = "RawStep")]
pub enum RetrievalStep {
    Plan(u32),
    Expansion,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawStep {
    Step(u32),
    Marker(String),
}

impl TryFrom<RawStep> for RetrievalStep {
    type Error = String;

    fn try_from(raw: RawStep) -> Result<Self, Self::Error> {
        match raw {
            RawStep::Step(n) => Ok(Self::Plan(n)),
            RawStep::Marker(m) if m == "expansion" => Ok(Self::Expansion),
            RawStep::Marker(m) => Err(format!("unknown retrieval step marker: {m}")),
        }
    }
}

impl From<RetrievalStep> for RawStep {
    fn from(step: RetrievalStep) -> Self {
        match step {
            RetrievalStep::Plan(n) => RawStep::Step(n),
            RetrievalStep::Expansion => RawStep::Marker("expansion".into()),
        }
    }
}

impl std::fmt::Display for RetrievalStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plan(n) => write!(f, "{n}"),
            Self::Expansion => write!(f, "expansion"),
        }
    }
}

/// One retrieved passage instance. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceDocument {
    /// The passage text
    pub content: String,

    /// Provenance tags copied from the search backend
    #[serde(default)]
    pub metadata: Metadata,

    /// The plan step or expansion that found it
    pub retrieval_step: RetrievalStep,

    /// The string actually searched
    pub search_target: String,

    /// Why it was searched
    pub purpose: String,
}

impl EvidenceDocument {
    /// Wrap a search passage with its retrieval provenance.
    pub fn from_passage(
        passage: Passage,
        retrieval_step: RetrievalStep,
        search_target: impl Into<String>,
        purpose: impl Into<String>,
    ) -> Self {
        Self {
            content: passage.content,
            metadata: passage.metadata,
            retrieval_step,
            search_target: search_target.into(),
            purpose: purpose.into(),
        }
    }

    /// The `source` metadata tag, if the backend provided one.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(|v| v.as_str())
    }
}
