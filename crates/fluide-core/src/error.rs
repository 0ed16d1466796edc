//! Core error types for fluide-core.
//!
//! Corrupted local data is never an error: readers log it and fall back to an
//! empty default. Everything else a caller can act on lands here.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for fluide-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Local store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Grammar-check collaborator errors
    #[error("Grammar check error: {0}")]
    Grammar(#[from] GrammarError),

    /// Audio output errors
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Reading a key failed at the backend level
    #[error("Failed to read '{key}': {message}")]
    ReadFailed { key: String, message: String },

    /// The backend rejected a write (quota, locked file, ...)
    #[error("Failed to write '{key}': {message}")]
    WriteFailed { key: String, message: String },

    /// A value could not be serialized before writing
    #[error("Failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// No usable data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Grammar-check errors.
///
/// `CredentialMissing` is a precondition the caller must surface as "configure
/// a key"; `Upstream` is the generic retryable failure.
#[derive(Error, Debug)]
pub enum GrammarError {
    /// No API key stored or present in the environment
    #[error("No API key configured for {provider}")]
    CredentialMissing { provider: String },

    /// The service failed or returned something unusable
    #[error("Grammar service failed: {0}")]
    Upstream(String),
}

/// Audio output errors.
#[derive(Error, Debug)]
pub enum AudioError {
    /// No output device could be opened
    #[error("No audio output available: {0}")]
    DeviceUnavailable(String),

    /// The audio thread is gone
    #[error("Audio backend disconnected")]
    Disconnected,
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A required text field was empty
    #[error("'{field}' must not be empty")]
    EmptyField { field: String },

    /// Referenced item does not exist
    #[error("Unknown {kind}: {id}")]
    NotFound { kind: String, id: String },

    /// Operation not allowed in the current practice phase
    #[error("Not allowed during {phase}: {message}")]
    WrongPhase { phase: String, message: String },
}

impl From<reqwest::Error> for GrammarError {
    fn from(err: reqwest::Error) -> Self {
        GrammarError::Upstream(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
