//! API server implementation
//!
//! This module contains the API server implementation and router setup.
//! Everything under `/_api` and `/_health` is service plumbing; any other
//! GET path is treated as the tail of an entity identity URI.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tracing::info;

use crate::error::{RegistryError, RegistryResult};
use crate::registry::RegistryManager;

use super::endpoints::*;

/// API server for the entity registry
pub struct EntityRegistryApi {
    /// Registry manager
    registry: Arc<RegistryManager>,

    /// Router
    router: Router,
}

impl EntityRegistryApi {
    /// Create a new API server
    pub fn new(registry: Arc<RegistryManager>) -> Self {
        let router = Self::create_router(registry.clone());
        Self { registry, router }
    }

    /// Create the router with all endpoints.
    ///
    /// The wildcard entity route must stay last so the service routes
    /// keep precedence over identity lookups.
    fn create_router(registry: Arc<RegistryManager>) -> Router {
        Router::new()
            .route("/_health", get(health_check))
            .route(
                "/_api/entities",
                get(list_entities).post(create_entities),
            )
            .route("/_api/stats", get(get_stats))
            .route("/{*identity}", get(get_entity))
            .with_state(registry)
    }

    /// Get the router
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind and serve until the listener fails.
    pub async fn serve(&self) -> RegistryResult<()> {
        self.registry.initialize().await?;

        let config = self.registry.get_config();
        let address = format!("{}:{}", config.api.host, config.api.port);

        let listener = tokio::net::TcpListener::bind(&address).await?;
        info!(%address, base_url = %config.base_url, "Entity registry listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| RegistryError::internal(&e.to_string()))?;

        Ok(())
    }
}
