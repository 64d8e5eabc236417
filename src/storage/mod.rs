//! Storage backends for the Entity Registry
//!
//! This module provides the key-value persistence abstraction the registry
//! stores entity documents in. Each specific namespace maps to a distinct
//! underlying collection; collection names obey the reserved constraints
//! checked by [`crate::uri::validate_namespace`].

pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::RegistryResult;
use crate::uri::EntityUri;

/// Storage backend trait
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Retrieve a stored entity document by its URI
    async fn read(&self, uri: &EntityUri) -> RegistryResult<Option<Value>>;

    /// Store entity documents; returns the stored documents
    async fn create(&self, documents: Vec<(EntityUri, Value)>) -> RegistryResult<Vec<Value>>;

    /// List all documents, optionally restricted to one specific namespace
    async fn list(&self, specific_namespace: Option<&str>) -> RegistryResult<Vec<Value>>;

    /// Health check
    async fn health_check(&self) -> RegistryResult<bool>;

    /// Get storage statistics
    async fn get_stats(&self) -> RegistryResult<StorageStats>;

    /// Shutdown the storage backend
    async fn shutdown(&self) -> RegistryResult<()>;
}

/// Storage statistics
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StorageStats {
    /// Total number of stored entities
    pub total_entities: u64,

    /// Number of collections (one per namespace)
    pub total_collections: u64,

    /// Total storage size in bytes (serialized)
    pub total_size_bytes: u64,

    /// Last activity timestamp
    pub last_activity: chrono::DateTime<chrono::Utc>,
}

pub use memory::MemoryStorage;
