//! The multi-hop reasoning loop.
//!
//! A query runs **Plan → Retrieve → Analyze**, repeating the last two
//! until the analysis is confident enough, stops asking for more, or the
//! round budget runs out:
//!
//! 1. **Plan**: the model turns the question into search steps
//! 2. **Retrieve**: each step (or each missing entity) is searched
//! 3. **Analyze**: the model reasons over every document gathered so far
//! 4. **Decide**: stop, or search for what the analysis says is missing
//!
//! Every stage degrades to a documented default instead of failing, so a
//! run always ends with a [`QueryResult`](hoprag_core::QueryResult).

pub mod analyzer;
pub mod events;
pub mod extraction;
pub mod orchestrator;
pub mod planner;
pub mod prompts;
pub mod retriever;

#[cfg(test)]
mod test_helpers;

pub use analyzer::Analyzer;
pub use events::RunEvent;
pub use extraction::{Extraction, extract};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use planner::QueryPlanner;
pub use retriever::{Retriever, expansion_purpose};
