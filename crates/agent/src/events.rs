//! Progress events published while a query runs.
//!
//! Sent on an optional `tokio::sync::mpsc` channel so a front end can show
//! what the orchestrator is doing without waiting for the final result.

use hoprag_core::QueryType;
use serde::{Deserialize, Serialize};

/// Events emitted by the orchestrator during one run, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// The plan is ready; `defaulted` when the fallback plan is used.
    Planned {
        query_type: QueryType,
        steps: usize,
        expected_hops: u32,
        defaulted: bool,
    },

    /// A retrieve/analyze round begins.
    RoundStarted { round: u32, expansion: bool },

    /// Retrieval for the round finished.
    Retrieved {
        round: u32,
        new_documents: usize,
        total_documents: usize,
    },

    /// Analysis for the round finished.
    Analyzed {
        round: u32,
        confidence: f32,
        need_more_search: bool,
        defaulted: bool,
    },

    /// The run stopped at a round boundary because it was cancelled.
    Cancelled { iterations: u32 },

    /// The run is complete.
    Finished {
        iterations: u32,
        total_documents: usize,
        confidence: f32,
    },
}

impl RunEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Planned { .. } => "planned",
            Self::RoundStarted { .. } => "round_started",
            Self::Retrieved { .. } => "retrieved",
            Self::Analyzed { .. } => "analyzed",
            Self::Cancelled { .. } => "cancelled",
            Self::Finished { .. } => "finished",
        }
    }
}
