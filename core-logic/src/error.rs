//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use thiserror::Error;

/// Unified error type for core-logic operations.
///
/// This enum wraps all specific error types and provides a unified
/// error interface for the application layer.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Config(ConfigError),

    #[error(transparent)]
    Credential(CredentialError),

    #[error(transparent)]
    Network(NetworkError),
}

impl From<ConfigError> for CoreError {
    fn from(e: ConfigError) -> Self {
        CoreError::Config(e)
    }
}

impl From<CredentialError> for CoreError {
    fn from(e: CredentialError) -> Self {
        CoreError::Credential(e)
    }
}

impl From<NetworkError> for CoreError {
    fn from(e: NetworkError) -> Self {
        CoreError::Network(e)
    }
}

/// Configuration-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: '{field}'")]
    MissingField { field: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Parse error in {path}: {msg}")]
    Parse { path: String, msg: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("I/O error reading {path}: {msg}")]
    IoError { path: String, msg: String },
}

impl ConfigError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Login payload decoding and bearer exchange errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Failed to decode login payload: {reason}")]
    Decode { reason: String },

    #[error("Bearer exchange failed: {reason}")]
    Exchange { reason: String },
}

/// Network and remote-service errors
///
/// `Timeout` and `Connection` are transport failures (the request never
/// produced a response). `HttpError` is a protocol failure: the remote side
/// answered with a non-2xx status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Request timeout after {timeout_ms}ms to {endpoint}")]
    Timeout { timeout_ms: u64, endpoint: String },

    #[error("Connection to {endpoint} failed: {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("HTTP error {status_code} from {endpoint}")]
    HttpError { status_code: u16, endpoint: String },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

impl NetworkError {
    /// Transport failures are worth retrying; a definitive answer from the
    /// server is not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            NetworkError::Timeout { .. } | NetworkError::Connection { .. }
        )
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            NetworkError::HttpError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}
