//! Error types for the `paperscope` crate.

use thiserror::Error;

/// Errors that can occur in hybrid search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    /// An error from the relational paper store.
    ///
    /// The paper store is the engine's only hard dependency, so these
    /// errors are fatal and propagate to the caller unmodified.
    #[error("Paper store error: {0}")]
    StoreError(#[from] sqlx::Error),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector index backend.
    #[error("Vector index error ({backend}): {message}")]
    VectorIndexError {
        /// The vector index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred while requesting query expansions.
    #[error("Query expansion error ({backend}): {message}")]
    ExpansionError {
        /// The expansion backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// A convenience result type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
