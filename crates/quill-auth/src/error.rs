//! Error types for authentication.

use thiserror::Error;

/// Authentication-specific errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid credentials.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHashError,

    /// A token could not be signed or failed verification.
    #[error("{0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Validation error, carrying a message meant for the client.
    #[error("{0}")]
    Validation(String),
}

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;
