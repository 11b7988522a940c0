//! Core error types for glimpse-core.
//!
//! This module defines the error hierarchy using thiserror. Context
//! resolution failures (bad timestamps, unknown time zones) are not
//! represented here on purpose: they are recovered locally by omitting
//! the dependent field and never abort a rotation cycle.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for glimpse-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Session registry errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors surfaced by an external context source (calendar/mail)
    #[error("Context source error: {0}")]
    Source(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Session-registry errors.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No session is registered under the given device reference
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    /// Device reference failed basic validation
    #[error("Invalid device reference: expected at least {min} characters, got {len}")]
    InvalidDeviceRef { min: usize, len: usize },

    /// Failed to restore the registry snapshot
    #[error("Failed to load registry from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to persist the registry snapshot
    #[error("Failed to save registry to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },
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

    /// Missing or unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
