//! Shared fakes for stage and orchestrator tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use hoprag_core::error::{ProviderError, SearchError};
use hoprag_core::{LanguageModel, Passage, SimilaritySearch};

/// A model that returns scripted answers in order.
///
/// Records every `(instructions, prompt)` pair it receives.
/// Panics if more calls are made than answers provided.
pub struct ScriptedModel {
    answers: Mutex<Vec<String>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedModel {
    pub fn new(answers: Vec<&str>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().map(String::from).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, instructions: &str, prompt: &str) -> Result<String, ProviderError> {
        let mut calls = self.calls.lock().unwrap();
        let answers = self.answers.lock().unwrap();
        let answer = answers.get(calls.len()).cloned().unwrap_or_else(|| {
            panic!(
                "ScriptedModel: no more answers (call #{}, have {})",
                calls.len(),
                answers.len()
            )
        });
        calls.push((instructions.to_string(), prompt.to_string()));
        Ok(answer)
    }
}

/// A model whose every call fails.
pub struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _instructions: &str, _prompt: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }
}

/// A search backend with canned passages per exact query.
///
/// Unknown queries return nothing; queries listed in `failing` error out.
#[derive(Default)]
pub struct StaticSearch {
    passages: HashMap<String, Vec<Passage>>,
    failing: Vec<String>,
    queries: Mutex<Vec<(String, f32)>>,
}

impl StaticSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, query: &str, contents: &[&str]) -> Self {
        self.passages.insert(
            query.to_string(),
            contents
                .iter()
                .map(|c| Passage::new(*c).with_tag("source", format!("{query}.txt")))
                .collect(),
        );
        self
    }

    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing.push(query.to_string());
        self
    }

    pub fn queries(&self) -> Vec<(String, f32)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimilaritySearch for StaticSearch {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(&self, query: &str, threshold: f32) -> Result<Vec<Passage>, SearchError> {
        self.queries.lock().unwrap().push((query.to_string(), threshold));
        if self.failing.iter().any(|q| q == query) {
            return Err(SearchError::QueryFailed(format!("index unavailable for {query}")));
        }
        Ok(self.passages.get(query).cloned().unwrap_or_default())
    }
}
