//! Analysis — the analyzer's per-round verdict over the accumulated evidence.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use crate::lenient;

/// Confidence used whenever the model did not provide a usable one.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// One atomic fact in the evidentiary trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningFact {
    #[serde(default, deserialize_with = "lenient::string")]
    pub fact: String,

    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// The result of one analysis round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default, deserialize_with = "lenient_chain")]
    pub reasoning_chain: Vec<ReasoningFact>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub conclusion: String,

    /// Always within `[0.0, 1.0]` after [`Analysis::normalized`].
    #[serde(default = "default_confidence", deserialize_with = "lenient_confidence")]
    pub confidence: f32,

    /// Unresolved gaps, unique and in first-seen order.
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub missing_info: Vec<String>,

    #[serde(default, deserialize_with = "lenient::bool_or_false")]
    pub need_more_search: bool,
}

fn default_confidence() -> f32 {
    DEFAULT_CONFIDENCE
}

fn lenient_confidence<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(lenient::opt_f32(deserializer)?.unwrap_or(DEFAULT_CONFIDENCE))
}

/// Accept facts as objects or bare strings; anything else is dropped.
fn lenient_chain<'de, D>(deserializer: D) -> Result<Vec<ReasoningFact>, D::Error>
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
            Value::String(fact) => Some(ReasoningFact { fact, source: None }),
            obj @ Value::Object(_) => serde_json::from_value(obj).ok(),
            _ => None,
        })
        .collect())
}

impl Analysis {
    /// The analysis used when the model's answer can't be parsed.
    ///
    /// The raw answer is kept as the conclusion, since it is still the best
    /// available attempt at an answer.
    pub fn fallback(raw_response: &str) -> Self {
        Self {
            reasoning_chain: Vec::new(),
            conclusion: raw_response.to_string(),
            confidence: DEFAULT_CONFIDENCE,
            missing_info: Vec::new(),
            need_more_search: false,
        }
    }

    /// Clamp confidence into range and make `missing_info` a trimmed,
    /// order-preserving set. Facts with no text are dropped.
    pub fn normalized(mut self) -> Self {
        self.confidence = if self.confidence.is_nan() {
            DEFAULT_CONFIDENCE
        } else {
            self.confidence.clamp(0.0, 1.0)
        };

        let mut seen = HashSet::new();
        self.missing_info = self
            .missing_info
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty() && seen.insert(m.clone()))
            .collect();

        self.reasoning_chain.retain(|f| !f.fact.trim().is_empty());
        self
    }
}
