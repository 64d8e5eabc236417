//! Entity Registry for SOFT/DLite data models
//!
//! This crate provides a registry service and client tooling for
//! versioned entity schema documents: URI grammar and relaxed semantic
//! versioning, the four supported schema variants, upload conflict
//! resolution, and an HTTP API over pluggable storage.

pub mod api;
pub mod batch;
pub mod client;
pub mod config;
pub mod conflict;
pub mod entity;
pub mod error;
pub mod registry;
pub mod storage;
pub mod uri;
pub mod version;

// Re-export main types
pub use config::RegistryConfig;
pub use conflict::{ConflictResolution, ConflictState};
pub use entity::{resolve_entity, Entity, EntityVariant};
pub use error::{RegistryError, RegistryResult};
pub use registry::{RegistryManager, RegistryState, RegistryStats};
pub use storage::{MemoryStorage, StorageBackend};
pub use uri::{EntityUri, UriGrammar};
pub use version::SemanticVersion;

use std::sync::Arc;

use serde_json::Value;

/// Entity Registry version
pub const ENTITY_REGISTRY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Entity Registry name
pub const ENTITY_REGISTRY_NAME: &str = "entity-registry";

/// Entity Registry for SOFT/DLite data models
///
/// This provides a single handle over the registry manager for embedding
/// the registry in other services or tests without going through HTTP.
pub struct EntityRegistry {
    /// Registry manager
    manager: Arc<RegistryManager>,
}

impl EntityRegistry {
    /// Create a new entity registry with in-memory storage
    pub async fn new(config: RegistryConfig) -> RegistryResult<Self> {
        let manager = Arc::new(RegistryManager::new(config)?);
        manager.initialize().await?;
        Ok(Self { manager })
    }

    /// Resolve and store entity documents
    pub async fn create_entities(&self, documents: Vec<Value>) -> RegistryResult<Vec<Entity>> {
        self.manager.create_entities(documents).await
    }

    /// Retrieve a stored entity document by its identity URI
    pub async fn get_entity(&self, uri: &str) -> RegistryResult<Option<Value>> {
        self.manager.get_entity(uri).await
    }

    /// List stored entity documents
    pub async fn list_entities(
        &self,
        specific_namespace: Option<&str>,
    ) -> RegistryResult<Vec<Value>> {
        self.manager.list_entities(specific_namespace).await
    }

    /// Get registry statistics
    pub async fn get_stats(&self) -> RegistryResult<RegistryStats> {
        self.manager.get_stats().await
    }

    /// Health check
    pub async fn health_check(&self) -> RegistryResult<bool> {
        self.manager.health_check().await
    }

    /// Get the registry manager
    pub fn manager(&self) -> &Arc<RegistryManager> {
        &self.manager
    }

    /// Shutdown the entity registry
    pub async fn shutdown(self) -> RegistryResult<()> {
        self.manager.shutdown().await
    }
}
