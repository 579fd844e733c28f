//! Configuration loading, validation, and management for HopRAG.
//!
//! Loads configuration from `~/.hoprag/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.hoprag/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Reasoning loop settings
    #[serde(default)]
    pub rag: RagConfig,

    /// Knowledge base settings
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "deepseek".into()
}
fn default_model() -> String {
    "deepseek-chat".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    4096
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("rag", &self.rag)
            .field("knowledge", &self.knowledge)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Settings for the plan → retrieve → analyze loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Minimum similarity for a passage to count as a hit
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Upper bound on retrieve/analyze rounds per query
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Confidence above which the loop stops even if more search is requested
    #[serde(default = "default_confidence_cutoff")]
    pub confidence_cutoff: f32,

    /// Run the searches of one round concurrently
    #[serde(default)]
    pub parallel_search: bool,
}

fn default_similarity_threshold() -> f32 {
    0.5
}
fn default_max_iterations() -> u32 {
    3
}
fn default_confidence_cutoff() -> f32 {
    0.8
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            max_iterations: default_max_iterations(),
            confidence_cutoff: default_confidence_cutoff(),
            parallel_search: false,
        }
    }
}

/// Knowledge base storage and scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// `file` (JSONL on disk) or `memory`
    #[serde(default = "default_knowledge_backend")]
    pub backend: String,

    /// JSONL file used by the `file` backend
    #[serde(default = "default_knowledge_path")]
    pub path: PathBuf,

    /// Passages returned per search
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// `none` for lexical scoring, or a provider name for embeddings
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Characters per chunk when loading documents
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_knowledge_backend() -> String {
    "file".into()
}
fn default_knowledge_path() -> PathBuf {
    AppConfig::config_dir().join("knowledge.jsonl")
}
fn default_max_results() -> usize {
    3
}
fn default_embedding_provider() -> String {
    "none".into()
}
fn default_embedding_model() -> String {
    "bge-m3:latest".into()
}
fn default_chunk_size() -> usize {
    300
}
fn default_chunk_overlap() -> usize {
    30
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            backend: default_knowledge_backend(),
            path: default_knowledge_path(),
            max_results: default_max_results(),
            embedding_provider: default_embedding_provider(),
            embedding_model: default_embedding_model(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl KnowledgeConfig {
    /// Whether passages are scored with embeddings rather than lexically.
    pub fn uses_embeddings(&self) -> bool {
        !self.embedding_provider.is_empty() && self.embedding_provider != "none"
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.hoprag/config.toml).
    ///
    /// Also checks environment variables for API keys:
    /// - `HOPRAG_API_KEY` (highest priority)
    /// - `DEEPSEEK_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("HOPRAG_API_KEY")
                .ok()
                .or_else(|| std::env::var("DEEPSEEK_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("HOPRAG_PROVIDER") {
            config.default_provider = provider;
        }

        if let Ok(model) = std::env::var("HOPRAG_MODEL") {
            config.default_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Write the default config to `path` unless a file is already there.
    ///
    /// Returns `false` when an existing file was left untouched.
    pub fn write_default(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }
        let write_err = |e: std::io::Error| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, Self::default_toml()).map_err(write_err)?;
        Ok(true)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".hoprag")
    }

    /// Path of the main config file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.rag.similarity_threshold) {
            return Err(ConfigError::ValidationError(
                "rag.similarity_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.rag.confidence_cutoff) {
            return Err(ConfigError::ValidationError(
                "rag.confidence_cutoff must be between 0.0 and 1.0".into(),
            ));
        }

        if self.rag.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "rag.max_iterations must be at least 1".into(),
            ));
        }

        if self.knowledge.max_results == 0 {
            return Err(ConfigError::ValidationError(
                "knowledge.max_results must be at least 1".into(),
            ));
        }

        if self.knowledge.chunk_overlap >= self.knowledge.chunk_size {
            return Err(ConfigError::ValidationError(
                "knowledge.chunk_overlap must be smaller than knowledge.chunk_size".into(),
            ));
        }

        match self.knowledge.backend.as_str() {
            "file" | "memory" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "knowledge.backend must be \"file\" or \"memory\", got \"{other}\""
            ))),
        }
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            rag: RagConfig::default(),
            knowledge: KnowledgeConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Failed to write config file at {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },
}
