//! Wiring from configuration to a ready-to-run orchestrator.

use std::error::Error;
use std::sync::Arc;

use hoprag_agent::{Orchestrator, OrchestratorConfig, RunEvent};
use hoprag_config::AppConfig;
use hoprag_core::{LanguageModel, ProviderModel, QueryError, QueryResult, SimilaritySearch};
use hoprag_knowledge::{
    Embedder, FileKnowledgeBase, InMemoryKnowledgeBase, KnowledgeStore, demo_passages,
};
use hoprag_providers::{ProviderRouter, build_from_config, embedding_provider};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::render;

/// Global command-line overrides.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub threshold: Option<f32>,
    pub max_iterations: Option<u32>,
    pub json: bool,
}

impl RunOptions {
    /// Loop settings from config, with command-line overrides applied.
    pub fn orchestrator_config(&self, config: &AppConfig) -> OrchestratorConfig {
        OrchestratorConfig {
            similarity_threshold: self.threshold.unwrap_or(config.rag.similarity_threshold),
            max_iterations: self.max_iterations.unwrap_or(config.rag.max_iterations),
            confidence_cutoff: config.rag.confidence_cutoff,
            parallel_search: config.rag.parallel_search,
        }
    }

    pub fn threshold(&self, config: &AppConfig) -> f32 {
        self.threshold.unwrap_or(config.rag.similarity_threshold)
    }
}

pub fn load_config() -> Result<AppConfig, Box<dyn Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Providers that run locally and need no key.
fn is_local_provider(name: &str) -> bool {
    matches!(name, "ollama" | "vllm" | "llamacpp" | "llama.cpp")
}

/// Whether the default provider can be called with what is configured.
pub fn has_usable_key(config: &AppConfig) -> bool {
    config.has_api_key()
        || is_local_provider(&config.default_provider)
        || config
            .providers
            .get(&config.default_provider)
            .is_some_and(|p| p.api_key.is_some())
}

fn require_api_key(config: &AppConfig) -> Result<(), Box<dyn Error>> {
    if has_usable_key(config) {
        return Ok(());
    }
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    export DEEPSEEK_API_KEY='sk-...'   (recommended)");
    eprintln!("    export OPENAI_API_KEY='sk-...'     (for OpenAI direct)");
    eprintln!("    export HOPRAG_API_KEY='sk-...'     (generic)");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_path().display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}

/// Open the configured knowledge base.
///
/// The `memory` backend keeps nothing between runs, so it starts out
/// holding the demo corpus.
pub async fn open_store(
    config: &AppConfig,
    router: &ProviderRouter,
) -> Result<Arc<dyn KnowledgeStore>, Box<dyn Error>> {
    let knowledge = &config.knowledge;

    let embedder = embedding_provider(config, router)
        .map(|provider| Embedder::new(provider, &knowledge.embedding_model));
    if knowledge.uses_embeddings() && embedder.is_none() {
        warn!(
            provider = %knowledge.embedding_provider,
            "Embedding provider unavailable, falling back to lexical scoring"
        );
    }

    let store: Arc<dyn KnowledgeStore> = match knowledge.backend.as_str() {
        "memory" => {
            let mut kb = InMemoryKnowledgeBase::new().with_max_results(knowledge.max_results);
            if let Some(embedder) = embedder {
                kb = kb.with_embedder(embedder);
            }
            let added = kb.add_passages(demo_passages()).await?;
            debug!(added, "In-memory knowledge base seeded with demo corpus");
            Arc::new(kb)
        }
        _ => {
            let mut kb = FileKnowledgeBase::open(&knowledge.path)
                .with_max_results(knowledge.max_results);
            if let Some(embedder) = embedder {
                kb = kb.with_embedder(embedder);
            }
            Arc::new(kb)
        }
    };

    Ok(store)
}

/// Everything needed to answer questions: model, knowledge base, settings.
pub struct Session {
    pub config: AppConfig,
    model: Arc<dyn LanguageModel>,
    store: Arc<dyn KnowledgeStore>,
    settings: OrchestratorConfig,
    progress: bool,
}

impl Session {
    pub async fn open(options: &RunOptions) -> Result<Self, Box<dyn Error>> {
        let config = load_config()?;
        require_api_key(&config)?;

        let router = build_from_config(&config);
        let provider = router.default().ok_or("No default provider configured")?;
        let model = ProviderModel::new(provider, &config.default_model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens);

        let store = open_store(&config, &router).await?;
        if store.count().await? == 0 {
            warn!("Knowledge base is empty, run `hoprag kb setup` first");
        }

        let settings = options.orchestrator_config(&config);
        Ok(Self {
            config,
            model: Arc::new(model),
            store,
            settings,
            progress: !options.json,
        })
    }

    pub fn settings(&self) -> &OrchestratorConfig {
        &self.settings
    }

    /// Answer one question.
    ///
    /// Ctrl-C stops the run at the next round boundary and the partial
    /// result is returned.
    pub async fn ask(&self, query: &str) -> Result<QueryResult, QueryError> {
        let search: Arc<dyn SimilaritySearch> = self.store.clone();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let mut orchestrator = Orchestrator::new(self.model.clone(), search)
            .with_config(self.settings)
            .with_cancellation(cancel_rx);

        let printer = if self.progress {
            let (tx, rx) = mpsc::channel(32);
            orchestrator = orchestrator.with_events(tx);
            Some(tokio::spawn(print_progress(rx)))
        } else {
            None
        };

        let result = {
            let run = orchestrator.run(query);
            tokio::pin!(run);
            tokio::select! {
                result = &mut run => result,
                Ok(()) = tokio::signal::ctrl_c() => {
                    let _ = cancel_tx.send(true);
                    warn!("Interrupted, stopping after the current round");
                    run.await
                }
            }
        };

        // Dropping the orchestrator closes the event channel.
        drop(orchestrator);
        if let Some(printer) = printer {
            let _ = printer.await;
        }
        result
    }
}

async fn print_progress(mut rx: mpsc::Receiver<RunEvent>) {
    while let Some(event) = rx.recv().await {
        if let Some(line) = render::format_event(&event) {
            eprintln!("{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoprag_config::ProviderConfig;

    #[test]
    fn overrides_win_over_config() {
        let config = AppConfig::default();
        let options = RunOptions {
            threshold: Some(0.3),
            max_iterations: Some(5),
            json: false,
        };
        let settings = options.orchestrator_config(&config);
        assert_eq!(settings.similarity_threshold, 0.3);
        assert_eq!(settings.max_iterations, 5);
        assert_eq!(settings.confidence_cutoff, 0.8);

        let settings = RunOptions::default().orchestrator_config(&config);
        assert_eq!(settings, OrchestratorConfig::default());
    }

    #[test]
    fn local_providers_need_no_key() {
        let mut config = AppConfig::default();
        assert!(!has_usable_key(&config));

        config.default_provider = "ollama".into();
        assert!(has_usable_key(&config));

        config.default_provider = "openai".into();
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-test".into()),
                ..ProviderConfig::default()
            },
        );
        assert!(has_usable_key(&config));
    }

    #[tokio::test]
    async fn memory_backend_starts_with_demo_corpus() {
        let mut config = AppConfig::default();
        config.knowledge.backend = "memory".into();
        let router = build_from_config(&config);
        let store = open_store(&config, &router).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 10);
        assert_eq!(store.name(), "in_memory");
    }

    #[tokio::test]
    async fn file_backend_opens_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.knowledge.path = dir.path().join("kb.jsonl");
        let router = build_from_config(&config);
        let store = open_store(&config, &router).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.name(), "file");
    }
}
