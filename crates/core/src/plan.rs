//! Retrieval plan — the planner's structured output.
//!
//! A plan is produced once per query and drives the first retrieval round.
//! Model-authored plans are normalized before use so that the invariants
//! below always hold for the rest of the pipeline:
//!
//! - `reasoning_steps` is non-empty
//! - `step` values are strictly increasing, starting at 1
//! - `expected_hops` is at least 1

use serde::{Deserialize, Serialize};
use crate::lenient;

/// Whether a query needs one hop or several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum QueryType {
    #[default]
    Simple,
    MultiHop,
}

impl From<String> for QueryType {
    fn from(s: String) -> Self {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "multihop" => Self::MultiHop,
            _ => Self::Simple,
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::MultiHop => write!(f, "multi_hop"),
        }
    }
}

/// What a reasoning step asks the retriever to do.
///
/// Only `search` is executed today; anything else is carried through and
/// skipped by the retriever.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepAction {
    #[default]
    Search,
    Other(String),
}

impl From<String> for StepAction {
    fn from(s: String) -> Self {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("search") {
            Self::Search
        } else {
            Self::Other(trimmed.to_string())
        }
    }
}

impl From<StepAction> for String {
    fn from(action: StepAction) -> Self {
        match action {
            StepAction::Search => "search".into(),
            StepAction::Other(s) => s,
        }
    }
}

/// One step of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    /// 1-based position in the plan
    #[serde(default, deserialize_with = "lenient::u32_or_zero")]
    pub step: u32,

    /// What to do (only `search` is executed)
    #[serde(default)]
    pub action: StepAction,

    /// The string to search for
    #[serde(default, deserialize_with = "lenient::string")]
    pub target: String,

    /// Why this step exists
    #[serde(default, deserialize_with = "lenient::string")]
    pub purpose: String,
}

impl ReasoningStep {
    /// A `search` step.
    pub fn search(step: u32, target: impl Into<String>, purpose: impl Into<String>) -> Self {
        Self {
            step,
            action: StepAction::Search,
            target: target.into(),
            purpose: purpose.into(),
        }
    }
}

/// The structured retrieval plan for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default, deserialize_with = "lenient_query_type")]
    pub query_type: QueryType,

    #[serde(default, deserialize_with = "lenient::string_list")]
    pub key_entities: Vec<String>,

    #[serde(default, deserialize_with = "lenient_steps")]
    pub reasoning_steps: Vec<ReasoningStep>,

    /// Advisory only; never enforced.
    #[serde(default = "default_hops", deserialize_with = "lenient::u32_or_zero")]
    pub expected_hops: u32,
}

fn default_hops() -> u32 {
    1
}

/// Non-string query types (`null`, numbers) read as `simple`.
fn lenient_query_type<'de, D>(deserializer: D) -> Result<QueryType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => QueryType::from(s),
        _ => QueryType::Simple,
    })
}

/// Accept steps as objects or bare target strings; anything else is dropped.
fn lenient_steps<'de, D>(deserializer: D) -> Result<Vec<ReasoningStep>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde_json::Value;

    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(target) => Some(ReasoningStep::search(0, target, String::new())),
            obj @ Value::Object(_) => serde_json::from_value(obj).ok(),
            _ => None,
        })
        .collect())
}

/// Purpose attached to the single step of a fallback plan.
pub const FALLBACK_PURPOSE: &str = "直接搜索相关信息";

impl Plan {
    /// The single-step plan used when planning output can't be used.
    pub fn fallback(user_query: &str) -> Self {
        Self {
            query_type: QueryType::Simple,
            key_entities: vec![user_query.to_string()],
            reasoning_steps: vec![ReasoningStep::search(1, user_query, FALLBACK_PURPOSE)],
            expected_hops: 1,
        }
    }

    /// Enforce the plan invariants, or `None` if nothing searchable is left.
    ///
    /// Blank-target steps are dropped, entities are trimmed, steps are
    /// renumbered `1..=n` when their numbering is not strictly increasing
    /// from 1, and `expected_hops` is raised to at least 1.
    pub fn normalized(mut self) -> Option<Self> {
        self.reasoning_steps.retain(|s| !s.target.trim().is_empty());
        if self.reasoning_steps.is_empty() {
            return None;
        }

        for step in &mut self.reasoning_steps {
            step.target = step.target.trim().to_string();
        }

        if !self.has_valid_numbering() {
            for (i, step) in self.reasoning_steps.iter_mut().enumerate() {
                step.step = i as u32 + 1;
            }
        }

        self.key_entities = self
            .key_entities
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();

        self.expected_hops = self.expected_hops.max(1);
        Some(self)
    }

    fn has_valid_numbering(&self) -> bool {
        let mut previous = 0;
        for (i, step) in self.reasoning_steps.iter().enumerate() {
            if (i == 0 && step.step != 1) || step.step <= previous {
                return false;
            }
            previous = step.step;
        }
        true
    }

    /// Steps the retriever will actually execute.
    pub fn search_steps(&self) -> impl Iterator<Item = &ReasoningStep> {
        self.reasoning_steps
            .iter()
            .filter(|s| s.action == StepAction::Search)
    }
}
