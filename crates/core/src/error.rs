//! Error types for the HopRAG domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all HopRAG operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Search errors ---
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    // --- Caller contract errors ---
    #[error("Invalid query: {0}")]
    Query(#[from] QueryError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Document loading failed for {path}: {reason}")]
    LoadFailed { path: String, reason: String },
}

/// Violations of the `run_query` caller contract.
///
/// These are the only errors a query run surfaces; everything upstream
/// of the caller degrades to a default instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("similarity threshold {0} is outside [0.0, 1.0]")]
    ThresholdOutOfRange(f32),

    #[error("confidence cutoff {0} is outside [0.0, 1.0]")]
    CutoffOutOfRange(f32),

    #[error("max_iterations must be at least 1")]
    ZeroIterations,
}
