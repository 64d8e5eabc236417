//! Entity Registry Manager
//!
//! Coordinates entity resolution and storage for the service side:
//! documents posted for creation are resolved through the schema variants,
//! deduplicated, and stored under their canonical URIs.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::RegistryConfig;
use crate::entity::{resolve_entity, Entity};
use crate::error::{RegistryError, RegistryResult};
use crate::storage::{MemoryStorage, StorageBackend, StorageStats};
use crate::uri::UriGrammar;

/// Registry state
#[derive(Debug, Clone)]
pub struct RegistryState {
    /// Whether the registry is initialized
    pub initialized: bool,

    /// Whether the registry is healthy
    pub healthy: bool,

    /// Last health check timestamp
    pub last_health_check: chrono::DateTime<chrono::Utc>,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            initialized: false,
            healthy: false,
            last_health_check: chrono::Utc::now(),
        }
    }
}

/// Registry statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Total number of stored entities
    pub total_entities: u64,

    /// Number of namespace collections
    pub total_collections: u64,

    /// Total storage size in bytes
    pub total_size_bytes: u64,

    /// Last activity timestamp
    pub last_activity: chrono::DateTime<chrono::Utc>,
}

impl From<StorageStats> for RegistryStats {
    fn from(stats: StorageStats) -> Self {
        Self {
            total_entities: stats.total_entities,
            total_collections: stats.total_collections,
            total_size_bytes: stats.total_size_bytes,
            last_activity: stats.last_activity,
        }
    }
}

/// Entity Registry Manager
pub struct RegistryManager {
    /// Configuration
    config: RegistryConfig,

    /// URI grammar for the configured base URL
    grammar: UriGrammar,

    /// Storage backend
    storage: Arc<dyn StorageBackend>,

    /// Registry state
    state: Arc<RwLock<RegistryState>>,
}

impl RegistryManager {
    /// Create a new registry manager with in-memory storage
    pub fn new(config: RegistryConfig) -> RegistryResult<Self> {
        let grammar = config.uri_grammar()?;
        let storage = Arc::new(MemoryStorage::new()?);

        Ok(Self {
            config,
            grammar,
            storage,
            state: Arc::new(RwLock::new(RegistryState::new())),
        })
    }

    /// Configuration in use
    pub fn get_config(&self) -> &RegistryConfig {
        &self.config
    }

    /// URI grammar in use
    pub fn grammar(&self) -> &UriGrammar {
        &self.grammar
    }

    /// Current registry state
    pub async fn get_state(&self) -> RegistryState {
        self.state.read().await.clone()
    }

    /// Initialize the registry
    pub async fn initialize(&self) -> RegistryResult<()> {
        self.config
            .validate()
            .map_err(|e| RegistryError::config(&e))?;

        let healthy = self.storage.health_check().await?;

        let mut state = self.state.write().await;
        state.initialized = true;
        state.healthy = healthy;
        state.last_health_check = chrono::Utc::now();

        info!("Entity registry initialized");
        Ok(())
    }

    /// Resolve and store entity documents.
    ///
    /// Duplicate URIs within the posted batch are rejected before anything
    /// is written; a URI that already exists in storage is rejected by the
    /// backend.
    pub async fn create_entities(&self, documents: Vec<Value>) -> RegistryResult<Vec<Entity>> {
        let mut entities = Vec::with_capacity(documents.len());
        let mut seen = std::collections::HashSet::new();

        for document in &documents {
            let entity = resolve_entity(document, &self.grammar)?;
            if !seen.insert(entity.uri().to_string()) {
                return Err(RegistryError::DuplicateIdentity {
                    uri: entity.uri().to_string(),
                    first: "request body".to_string(),
                    second: "request body".to_string(),
                });
            }
            entities.push(entity);
        }

        let mut to_store = Vec::with_capacity(entities.len());
        for entity in &entities {
            let uri = self.grammar.parse(entity.uri())?;
            to_store.push((uri, entity.to_canonical_value()?));
        }
        self.storage.create(to_store).await?;

        info!(count = entities.len(), "Entities created");
        Ok(entities)
    }

    /// Retrieve a stored entity document by URI.
    pub async fn get_entity(&self, uri: &str) -> RegistryResult<Option<Value>> {
        let uri = self.grammar.parse(uri)?;
        self.storage.read(&uri).await
    }

    /// List stored entity documents, optionally for one specific namespace.
    pub async fn list_entities(
        &self,
        specific_namespace: Option<&str>,
    ) -> RegistryResult<Vec<Value>> {
        self.storage.list(specific_namespace).await
    }

    /// Registry statistics
    pub async fn get_stats(&self) -> RegistryResult<RegistryStats> {
        Ok(self.storage.get_stats().await?.into())
    }

    /// Health check
    pub async fn health_check(&self) -> RegistryResult<bool> {
        let healthy = self.storage.health_check().await?;

        let mut state = self.state.write().await;
        state.healthy = healthy;
        state.last_health_check = chrono::Utc::now();

        Ok(healthy)
    }

    /// Shutdown the registry
    pub async fn shutdown(&self) -> RegistryResult<()> {
        self.storage.shutdown().await?;
        info!("Entity registry shutdown completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manager() -> RegistryManager {
        RegistryManager::new(RegistryConfig::default()).unwrap()
    }

    fn person(version: &str) -> Value {
        json!({
            "namespace": "http://onto-ns.com/meta",
            "version": version,
            "name": "Person",
            "properties": {"age": {"type": "int", "description": "age"}},
        })
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let manager = manager();
        let created = manager.create_entities(vec![person("0.1")]).await.unwrap();
        assert_eq!(created.len(), 1);

        let read = manager
            .get_entity("http://onto-ns.com/meta/0.1/Person")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read["uri"], json!("http://onto-ns.com/meta/0.1/Person"));
    }

    #[tokio::test]
    async fn test_duplicate_uris_in_batch_rejected_before_write() {
        let manager = manager();
        let result = manager
            .create_entities(vec![person("0.1"), person("0.1")])
            .await;
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateIdentity { .. })
        ));

        // Nothing was written.
        assert!(manager
            .get_entity("http://onto-ns.com/meta/0.1/Person")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_existing_uri_rejected_by_storage() {
        let manager = manager();
        manager.create_entities(vec![person("0.1")]).await.unwrap();
        let result = manager.create_entities(vec![person("0.1")]).await;
        assert!(matches!(
            result,
            Err(RegistryError::EntityAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_initialize_and_health() {
        let manager = manager();
        manager.initialize().await.unwrap();
        let state = manager.get_state().await;
        assert!(state.initialized);
        assert!(state.healthy);
        assert!(manager.health_check().await.unwrap());
    }
}
