//! Remote registry client
//!
//! The HTTP collaborator the CLI uses for the remote-existence check and
//! for uploads. One `GET {uri}` per unique entity URI, no retry: a
//! transport failure is surfaced immediately.

use serde_json::Value;
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};

/// HTTP client for a remote entity registry
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
}

impl RemoteClient {
    /// Create a new client
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Fetch the entity document stored at a URI.
    ///
    /// Returns `None` on 404; any other non-success status or transport
    /// error is fatal for the entity being checked.
    pub async fn fetch_entity(&self, uri: &str) -> RegistryResult<Option<Value>> {
        debug!(uri, "Checking remote registry");

        let response = self.http.get(uri).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(RegistryError::transport(format!(
                "GET {} returned {}",
                uri,
                response.status()
            )));
        }

        Ok(Some(response.json().await?))
    }

    /// Upload entity documents to the registry's creation endpoint.
    pub async fn create_entities(
        &self,
        endpoint: &str,
        documents: &[Value],
    ) -> RegistryResult<()> {
        debug!(endpoint, count = documents.len(), "Uploading entities");

        let response = self.http.post(endpoint).json(documents).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RegistryError::transport(format!(
                "POST {} returned {}: {}",
                endpoint, status, body
            )));
        }

        Ok(())
    }
}

impl Default for RemoteClient {
    fn default() -> Self {
        Self::new()
    }
}
