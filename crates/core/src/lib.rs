//! # HopRAG Core
//!
//! Domain types, capability traits, and error definitions for the HopRAG
//! multi-hop question answering engine. This crate has **no framework
//! dependencies**: it defines the records that flow between the reasoning
//! stages and the two capabilities the stages consume.
//!
//! ## Capabilities
//!
//! - [`LanguageModel`]: `complete(instructions, prompt) -> text`
//! - [`SimilaritySearch`]: `search(query, threshold) -> passages`
//!
//! Both are traits so the orchestrator can run against real backends or
//! deterministic fakes.

pub mod analysis;
pub mod error;
pub mod evidence;
pub mod lenient;
pub mod message;
pub mod plan;
pub mod provider;
pub mod reasoning;
pub mod result;
pub mod search;

// Re-export key types at crate root for ergonomics
pub use analysis::{Analysis, ReasoningFact};
pub use error::{Error, ProviderError, QueryError, Result, SearchError};
pub use evidence::{EvidenceDocument, RetrievalStep};
pub use message::{Message, Role};
pub use plan::{Plan, QueryType, ReasoningStep, StepAction};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use reasoning::{LanguageModel, ProviderModel};
pub use result::QueryResult;
pub use search::{Metadata, Passage, SimilaritySearch};
