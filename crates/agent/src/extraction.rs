//! Extraction layer — typed records out of free-form model text.
//!
//! Models are asked for JSON but answer with whatever they like: fenced
//! blocks, prose around an object, half an object. Extraction never fails.
//! It either parses a record or hands back the caller's default together
//! with the raw text and the reason parsing gave up.
//!
//! Candidates are tried in order:
//!
//! 1. the body of a fenced block tagged `json` (to the closing fence, or
//!    to the end of the text if the fence is never closed)
//! 2. the span from the first `{` to the last `}` inclusive
//!
//! The second candidate is greedy: two separate objects in one answer are
//! read as one span and fail to parse.

use serde::de::DeserializeOwned;

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// The outcome of extracting a record from model text.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    /// The text contained a usable record.
    Parsed(T),

    /// Nothing usable was found; `value` is the caller's default.
    Defaulted {
        value: T,
        raw: String,
        reason: String,
    },
}

impl<T> Extraction<T> {
    pub fn defaulted(value: T, raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Defaulted {
            value,
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Parsed(value) | Self::Defaulted { value, .. } => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Parsed(value) | Self::Defaulted { value, .. } => value,
        }
    }

    /// Why the default was used, if it was.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Parsed(_) => None,
            Self::Defaulted { reason, .. } => Some(reason),
        }
    }
}

/// Parse a `T` out of `raw`, or fall back to `default()`.
pub fn extract<T, F>(raw: &str, default: F) -> Extraction<T>
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    let candidates = json_candidates(raw);
    if candidates.is_empty() {
        return Extraction::defaulted(default(), raw, "no JSON object found");
    }

    let mut last_error = String::new();
    for candidate in candidates {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => return Extraction::Parsed(value),
            Err(e) => last_error = e.to_string(),
        }
    }
    Extraction::defaulted(default(), raw, format!("invalid JSON: {last_error}"))
}

/// Substrings of `text` that may hold the JSON record, most specific first.
pub fn json_candidates(text: &str) -> Vec<&str> {
    let mut candidates = Vec::with_capacity(2);

    if let Some(body) = fenced_json(text) {
        if !body.is_empty() {
            candidates.push(body);
        }
    }

    if let Some(span) = brace_span(text) {
        if !candidates.contains(&span) {
            candidates.push(span);
        }
    }

    candidates
}

fn fenced_json(text: &str) -> Option<&str> {
    // ASCII lowercasing keeps byte offsets valid for `text`.
    let start = text.to_ascii_lowercase().find(JSON_FENCE)? + JSON_FENCE.len();
    let rest = &text[start..];
    let body = match rest.find(FENCE) {
        Some(end) => &rest[..end],
        None => rest,
    };
    Some(body.trim())
}

fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
