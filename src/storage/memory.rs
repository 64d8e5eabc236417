//! In-memory storage implementation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{RegistryError, RegistryResult};
use crate::storage::{StorageBackend, StorageStats};
use crate::uri::EntityUri;

/// Collection name -> (URI -> document)
type Collections = HashMap<String, HashMap<String, Value>>;

/// In-memory storage implementation
pub struct MemoryStorage {
    /// Documents, grouped into one collection per namespace
    collections: Arc<RwLock<Collections>>,

    /// Last write/delete timestamp
    last_activity: Arc<RwLock<chrono::DateTime<chrono::Utc>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> RegistryResult<Self> {
        Ok(Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            last_activity: Arc::new(RwLock::new(chrono::Utc::now())),
        })
    }

    async fn touch(&self) {
        let mut last_activity = self.last_activity.write().await;
        *last_activity = chrono::Utc::now();
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn read(&self, uri: &EntityUri) -> RegistryResult<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&uri.collection())
            .and_then(|collection| collection.get(&uri.to_string()))
            .cloned())
    }

    async fn create(&self, documents: Vec<(EntityUri, Value)>) -> RegistryResult<Vec<Value>> {
        let mut stored = Vec::with_capacity(documents.len());
        {
            let mut collections = self.collections.write().await;
            for (uri, document) in documents {
                let collection = collections.entry(uri.collection()).or_default();
                let key = uri.to_string();
                if collection.contains_key(&key) {
                    return Err(RegistryError::EntityAlreadyExists(key));
                }
                collection.insert(key, document.clone());
                stored.push(document);
            }
        }
        self.touch().await;
        Ok(stored)
    }

    async fn list(&self, specific_namespace: Option<&str>) -> RegistryResult<Vec<Value>> {
        let collections = self.collections.read().await;
        let documents = match specific_namespace {
            Some(namespace) => collections
                .get(namespace)
                .map(|collection| collection.values().cloned().collect())
                .unwrap_or_default(),
            None => collections
                .values()
                .flat_map(|collection| collection.values().cloned())
                .collect(),
        };
        Ok(documents)
    }

    async fn health_check(&self) -> RegistryResult<bool> {
        // Reading the collection map is all the memory backend can fail at.
        let _ = self.collections.read().await;
        Ok(true)
    }

    async fn get_stats(&self) -> RegistryResult<StorageStats> {
        let collections = self.collections.read().await;

        let total_entities: usize = collections.values().map(|c| c.len()).sum();
        let total_size: usize = collections
            .values()
            .flat_map(|c| c.values())
            .map(|document| document.to_string().len())
            .sum();

        Ok(StorageStats {
            total_entities: total_entities as u64,
            total_collections: collections.len() as u64,
            total_size_bytes: total_size as u64,
            last_activity: *self.last_activity.read().await,
        })
    }

    async fn shutdown(&self) -> RegistryResult<()> {
        {
            let mut collections = self.collections.write().await;
            collections.clear();
        }
        tracing::debug!("Memory storage shutdown completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uri::UriGrammar;
    use serde_json::json;

    const BASE: &str = "http://onto-ns.com/meta";

    fn uri(text: &str) -> EntityUri {
        UriGrammar::new(BASE).unwrap().parse(text).unwrap()
    }

    fn document(uri_text: &str) -> Value {
        json!({"uri": uri_text, "properties": {}})
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let storage = MemoryStorage::new().unwrap();
        let person = uri("http://onto-ns.com/meta/0.1/Person");

        storage
            .create(vec![(person.clone(), document("http://onto-ns.com/meta/0.1/Person"))])
            .await
            .unwrap();

        let read = storage.read(&person).await.unwrap();
        assert_eq!(read, Some(document("http://onto-ns.com/meta/0.1/Person")));

        let absent = uri("http://onto-ns.com/meta/0.2/Person");
        assert_eq!(storage.read(&absent).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_rejects_existing_uri() {
        let storage = MemoryStorage::new().unwrap();
        let person = uri("http://onto-ns.com/meta/0.1/Person");

        storage
            .create(vec![(person.clone(), document("a"))])
            .await
            .unwrap();
        let result = storage.create(vec![(person, document("b"))]).await;
        assert!(matches!(
            result,
            Err(RegistryError::EntityAlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_namespaces_map_to_distinct_collections() {
        let storage = MemoryStorage::new().unwrap();
        storage
            .create(vec![
                (uri("http://onto-ns.com/meta/0.1/Person"), document("core")),
                (
                    uri("http://onto-ns.com/meta/materials/0.1/Alloy"),
                    document("materials"),
                ),
            ])
            .await
            .unwrap();

        assert_eq!(storage.list(Some("materials")).await.unwrap().len(), 1);
        assert_eq!(storage.list(Some("entities")).await.unwrap().len(), 1);
        assert_eq!(storage.list(None).await.unwrap().len(), 2);

        let stats = storage.get_stats().await.unwrap();
        assert_eq!(stats.total_entities, 2);
        assert_eq!(stats.total_collections, 2);
    }

    #[tokio::test]
    async fn test_shutdown_clears_collections() {
        let storage = MemoryStorage::new().unwrap();
        storage
            .create(vec![(uri("http://onto-ns.com/meta/0.1/Person"), document("x"))])
            .await
            .unwrap();
        storage.shutdown().await.unwrap();
        assert!(storage.list(None).await.unwrap().is_empty());
    }
}
