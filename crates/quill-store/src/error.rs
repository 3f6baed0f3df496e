//! Error types for persistence.

use thiserror::Error;

/// Store-specific errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored JSON column could not be decoded.
    #[error("Corrupt JSON column: {0}")]
    Json(#[from] serde_json::Error),

    /// A field failed validation. The message is meant for the client.
    #[error("{0}")]
    Validation(String),

    /// Input named a field the entity does not have.
    #[error("Property '{0}' does not exist")]
    UnknownField(String),

    /// An update carried no fields.
    #[error("No data provided for update")]
    EmptyUpdate,
}

impl StoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns true for errors caused by the input rather than the database.
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::UnknownField(_) | Self::EmptyUpdate
        )
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
