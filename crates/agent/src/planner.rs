//! Query planner — one reasoning call that turns a question into a plan.

use std::sync::Arc;

use hoprag_core::{LanguageModel, Plan};
use tracing::{debug, info, warn};

use crate::extraction::{Extraction, extract};
use crate::prompts::{PLANNER_INSTRUCTIONS, planner_prompt};

/// Produces the retrieval plan for a query. Stateless.
pub struct QueryPlanner {
    model: Arc<dyn LanguageModel>,
}

impl QueryPlanner {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Plan `user_query`. Never fails: any problem yields the fallback plan.
    pub async fn plan(&self, user_query: &str) -> Extraction<Plan> {
        let prompt = planner_prompt(user_query);
        debug!(model = %self.model.name(), prompt_chars = prompt.chars().count(), "Planning query");

        let raw = match self.model.complete(PLANNER_INSTRUCTIONS, &prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Planner call failed, using fallback plan");
                return Extraction::defaulted(Plan::fallback(user_query), "", e.to_string());
            }
        };

        let plan = match extract(&raw, || Plan::fallback(user_query)) {
            Extraction::Parsed(plan) => match plan.normalized() {
                Some(plan) => Extraction::Parsed(plan),
                None => Extraction::defaulted(
                    Plan::fallback(user_query),
                    raw,
                    "plan has no searchable steps",
                ),
            },
            defaulted => defaulted,
        };

        match &plan {
            Extraction::Parsed(p) => info!(
                query_type = %p.query_type,
                steps = p.reasoning_steps.len(),
                expected_hops = p.expected_hops,
                "Query planned"
            ),
            Extraction::Defaulted { reason, .. } => {
                warn!(reason = %reason, "Unusable plan, using fallback plan")
            }
        }
        plan
    }
}
