//! Error types for routing.

use thiserror::Error;

/// Router-specific errors.
///
/// Routing outcomes a client can cause (unknown path, unknown prefix) are
/// answered with a response at the point of detection and never show up
/// here. These variants cover misconfiguration and failures inside handlers
/// or middleware.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Invalid path pattern.
    #[error("invalid path pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A route references a handler that is not in the registry.
    #[error("no handler registered for `{0}`")]
    UnresolvedHandler(String),

    /// A value could not be serialized into a response body.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A handler or middleware failed with an error it did not translate.
    #[error("handler error: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RouterError {
    /// Wraps an arbitrary collaborator error.
    pub fn handler(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Handler(Box::new(err))
    }
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;
