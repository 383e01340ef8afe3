// ⚠️ Error types for the place-insights pipeline
//
// Provider failures propagate to the caller of fetch/enrich.
// Persisted-state failures are mostly caught where they happen (see snapshot.rs
// and review_log.rs) and only surface here when a caller asks for them.

use thiserror::Error;

/// Failure talking to the places provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network / transport failure (connection refused, timeout, TLS)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider answered with a non-OK status
    #[error("Provider returned status {status}: {message}")]
    Status { status: String, message: String },

    /// Response body did not have the expected shape
    #[error("Malformed provider response: {0}")]
    Malformed(String),
}

/// Invalid or unreadable configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid coordinates '{0}' (expected \"lat,lon\")")]
    InvalidCoordinates(String),

    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Places API key not configured (set api_key or PLACE_INSIGHTS_API_KEY)")]
    MissingApiKey,
}

/// Clustering rejected its input
#[derive(Debug, Error, PartialEq)]
pub enum ClusteringError {
    #[error("Cluster count must be at least 1 (got {0})")]
    InvalidClusterCount(usize),
}

/// Top-level pipeline error
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Clustering(#[from] ClusteringError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
