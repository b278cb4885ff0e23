//! Error types for the compliance and session guard layer.

use thiserror::Error;

pub use crate::session::AuthError;

/// Result type alias for portfolio-guard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error type
///
/// Expected validation outcomes (missing consent, expired consent) are not
/// errors; they are returned as [`crate::compliance::ConsentValidation`].
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl Error {
    /// HTTP status code this error maps to at the API boundary
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidInput(_) | Error::Json(_) => 400,
            Error::Auth(AuthError::Unauthorized) | Error::Auth(AuthError::InvalidCredentials) => {
                401
            }
            _ => 500,
        }
    }
}
