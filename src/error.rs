//! Error handling for the Entity Registry
//!
//! This module provides error types and result aliases for the entity
//! registry and its CLI client.

use thiserror::Error;

use crate::entity::resolve::VariantError;

/// Result type for entity registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Entity Registry error types
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Storage error
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// No schema variant matched the document
    #[error("Cannot resolve entity: no matching schema variant.\n{}", format_variant_errors(.errors))]
    NoMatchingVariant { errors: Vec<VariantError> },

    /// A URI or one of its components violates the grammar
    #[error("Invalid URI: {message}")]
    InvalidUri { message: String },

    /// Invalid version string
    #[error("Invalid version: {message}")]
    InvalidVersion { message: String },

    /// Two local entities resolved to the same URI
    #[error("Duplicate identity {uri}: {first} and {second}")]
    DuplicateIdentity {
        uri: String,
        first: String,
        second: String,
    },

    /// Remote entity exists and differs, and no valid replacement version was produced
    #[error("Version conflict for {uri} left unresolved: {message}")]
    VersionConflictUnresolved { uri: String, message: String },

    /// Entity not found
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// Entity already exists
    #[error("Entity already exists: {0}")]
    EntityAlreadyExists(String),

    /// A remote call could not complete
    #[error("Transport failure: {message}")]
    Transport { message: String },

    /// Serialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Deserialization error
    #[error("Deserialization error: {message}")]
    Deserialization { message: String },

    /// Invalid request
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

fn format_variant_errors(errors: &[VariantError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

impl RegistryError {
    /// Create a configuration error
    pub fn config(message: &str) -> Self {
        Self::Config {
            message: message.to_string(),
        }
    }

    /// Create a storage error
    pub fn storage(message: &str) -> Self {
        Self::Storage {
            message: message.to_string(),
        }
    }

    /// Create an invalid-URI error
    pub fn invalid_uri(message: impl Into<String>) -> Self {
        Self::InvalidUri {
            message: message.into(),
        }
    }

    /// Create an invalid-version error
    pub fn invalid_version(message: impl Into<String>) -> Self {
        Self::InvalidVersion {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: &str) -> Self {
        Self::Serialization {
            message: message.to_string(),
        }
    }

    /// Create a deserialization error
    pub fn deserialization(message: &str) -> Self {
        Self::Deserialization {
            message: message.to_string(),
        }
    }

    /// Create an invalid-request error
    pub fn invalid_request(message: &str) -> Self {
        Self::InvalidRequest {
            message: message.to_string(),
        }
    }

    /// Create an internal error
    pub fn internal(message: &str) -> Self {
        Self::Internal {
            message: message.to_string(),
        }
    }

    /// Short stable label for the error variant, used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Storage { .. } => "storage",
            Self::NoMatchingVariant { .. } => "no_matching_variant",
            Self::InvalidUri { .. } => "invalid_uri",
            Self::InvalidVersion { .. } => "invalid_version",
            Self::DuplicateIdentity { .. } => "duplicate_identity",
            Self::VersionConflictUnresolved { .. } => "version_conflict_unresolved",
            Self::EntityNotFound { .. } => "entity_not_found",
            Self::EntityAlreadyExists { .. } => "entity_already_exists",
            Self::Transport { .. } => "transport",
            Self::Serialization { .. } => "serialization",
            Self::Deserialization { .. } => "deserialization",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Internal { .. } => "internal",
        }
    }

    /// Get the error code for HTTP responses
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Config { .. } => 400,
            Self::NoMatchingVariant { .. } => 400,
            Self::InvalidUri { .. } => 400,
            Self::InvalidVersion { .. } => 400,
            Self::InvalidRequest { .. } => 400,
            Self::DuplicateIdentity { .. } => 409,
            Self::EntityAlreadyExists { .. } => 409,
            Self::VersionConflictUnresolved { .. } => 409,
            Self::EntityNotFound { .. } => 404,
            Self::Transport { .. } => 502,
            Self::Storage { .. } => 500,
            Self::Serialization { .. } => 500,
            Self::Deserialization { .. } => 500,
            Self::Internal { .. } => 500,
        }
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for RegistryError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for RegistryError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}
