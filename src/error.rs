//! Error types for the code analysis service.

use std::time::Duration;

/// Errors raised while resolving configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A value could not be decoded or parsed (bad JSON, base64 or YAML).
    #[error("config parse error: {reason}")]
    Parse { reason: String },

    /// A file named by the configuration does not exist.
    #[error("config file not found: {path}")]
    FileMissing { path: String },
}

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Failed to build or reach the connection pool.
    #[error("connection pool error: {0}")]
    Pool(String),

    /// Query or connection failure.
    #[error("database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Schema migration failure.
    #[error("migration error: {0}")]
    Migration(#[from] refinery::Error),
}

impl From<deadpool_postgres::PoolError> for DatabaseError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        DatabaseError::Pool(e.to_string())
    }
}

/// Errors from the LLM provider.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Missing or rejected API credentials.
    #[error("authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    /// Provider asked us to slow down.
    #[error("rate limited by provider {provider}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    /// Transport-level or non-2xx failure.
    #[error("request to provider {provider} failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    /// The provider answered with a body we could not use.
    #[error("invalid response from provider {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Failure kinds surfaced by the analysis service.
///
/// Carries only the failing step. Detail is logged server-side and never
/// reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// The language model round-trip failed.
    #[error("language model request failed")]
    Model,

    /// The analysis result could not be written to the history store.
    #[error("failed to persist the analysis result")]
    Persistence,
}
