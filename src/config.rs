//! Configuration management for the Entity Registry
//!
//! This module provides configuration structures and validation for the
//! registry service and the CLI client.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::uri::UriGrammar;

/// Entity Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// The service base URL all entity URIs must start with.
    /// Absolute HTTP(S) URL, no trailing slash.
    pub base_url: String,

    /// API configuration
    pub api: ApiConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Monitoring configuration
    pub monitoring: MonitoringConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://onto-ns.com/meta".to_string(),
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            monitoring: MonitoringConfig::default(),
        }
    }
}

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API host
    pub host: String,

    /// API port
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackendType {
    /// In-memory storage
    Memory,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage backend type
    pub backend: StorageBackendType,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendType::Memory,
        }
    }
}

/// Monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Enable health check endpoint
    pub enable_health_checks: bool,

    /// Log level
    pub log_level: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_health_checks: true,
            log_level: "info".to_string(),
        }
    }
}

impl RegistryConfig {
    /// Load configuration from file
    pub fn from_file(path: &PathBuf) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("ENTITY_REGISTRY"))
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from multiple sources with precedence
    pub fn from_sources(
        config_file: Option<&PathBuf>,
        env_prefix: &str,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Defaults first, then file, then environment.
        builder = builder.add_source(config::File::from_str(
            &Self::generate_example(),
            config::FileFormat::Toml,
        ));

        if let Some(path) = config_file {
            builder = builder.add_source(config::File::from(path.as_ref()));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?;
        settings.try_deserialize()
    }

    /// Load configuration with defaults
    pub fn load_with_defaults() -> Result<Self, config::ConfigError> {
        let config_paths = vec![
            PathBuf::from("config/entity-registry.toml"),
            PathBuf::from("entity-registry.toml"),
        ];

        for path in config_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Self::from_sources(None, "ENTITY_REGISTRY")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        // The URI grammar performs the base URL checks.
        UriGrammar::new(&self.base_url).map_err(|e| e.to_string())?;

        if self.api.host.is_empty() {
            return Err("api.host must not be empty".to_string());
        }
        if self.api.port == 0 {
            return Err("api.port must not be 0".to_string());
        }

        match self.monitoring.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(format!("monitoring.log_level '{}' is not valid", other));
            }
        }

        Ok(())
    }

    /// Build the URI grammar for the configured base URL.
    pub fn uri_grammar(&self) -> Result<UriGrammar, crate::error::RegistryError> {
        UriGrammar::new(&self.base_url)
    }

    /// Generate example configuration
    pub fn generate_example() -> String {
        r#"# Entity Registry Configuration Example

# All entity URIs must start with this base URL (no trailing slash).
base_url = "http://onto-ns.com/meta"

[api]
host = "0.0.0.0"
port = 8080

[storage]
# Storage backend type: Memory
backend = "Memory"

[monitoring]
enable_health_checks = true
log_level = "info"
"#
        .to_string()
    }
}
