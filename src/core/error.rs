/// DbFacade Error Module
///
/// This module defines the error type shared by every layer of the crate:
/// configuration, connection, statement execution and the administrative
/// passthroughs.
use thiserror::Error;

/// Error type for the database facade.
///
/// Connection failures are only returned to the caller when the facade is
/// configured with [`ConnectErrorPolicy::Propagate`](crate::ConnectErrorPolicy);
/// otherwise they are logged and the caller sees [`DbFacadeError::NotConnected`].
#[derive(Error, Debug)]
pub enum DbFacadeError {
    /// Missing or malformed connection configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The driver failed to open a handle
    #[error("Connection error: {0}")]
    Connection(String),

    /// No handle is available because the last connect attempt failed
    #[error("Not connected: the database connection could not be established")]
    NotConnected,

    /// Statement preparation, binding or execution failures
    #[error("Query error: {0}")]
    Query(String),

    /// Structured input that cannot produce valid SQL
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transaction-related errors
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Driver attributes or operations the active driver does not support
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Row-to-object conversion errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file parse errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Type alias for Result to use DbFacadeError as the error type.
pub type Result<T> = std::result::Result<T, DbFacadeError>;
