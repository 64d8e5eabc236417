//! API endpoint handlers
//!
//! This module contains the API endpoint handlers for the entity registry.
//! Entity retrieval is routed on the wildcard tail of the request path:
//! the stored identity URI is the configured base URL plus that tail.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde_json::Value;

use crate::registry::RegistryManager;

use super::error::ApiError;
use super::requests::ListEntitiesQuery;
use super::responses::*;

/// Health check endpoint
pub async fn health_check(
    State(registry): State<Arc<RegistryManager>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let healthy = registry.health_check().await?;
    let state = registry.get_state().await;

    Ok(Json(HealthResponse {
        status: if healthy {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        timestamp: chrono::Utc::now(),
        initialized: state.initialized,
        last_health_check: state.last_health_check,
    }))
}

/// Create entities endpoint
pub async fn create_entities(
    State(registry): State<Arc<RegistryManager>>,
    Json(documents): Json<Vec<Value>>,
) -> Result<Json<CreateEntitiesResponse>, ApiError> {
    let entities = registry.create_entities(documents).await?;

    Ok(Json(CreateEntitiesResponse {
        count: entities.len(),
        created: entities.iter().map(|e| e.uri().to_string()).collect(),
    }))
}

/// List entities endpoint
pub async fn list_entities(
    State(registry): State<Arc<RegistryManager>>,
    Query(query): Query<ListEntitiesQuery>,
) -> Result<Json<ListEntitiesResponse>, ApiError> {
    let entities = registry.list_entities(query.namespace.as_deref()).await?;

    Ok(Json(ListEntitiesResponse {
        total_count: entities.len(),
        entities,
    }))
}

/// Get entity endpoint
///
/// `identity` is the request path below the root; the full identity URI
/// is reconstructed against the configured base URL before lookup.
pub async fn get_entity(
    State(registry): State<Arc<RegistryManager>>,
    Path(identity): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let uri = format!("{}/{}", registry.get_config().base_url, identity);

    let document = registry
        .get_entity(&uri)
        .await?
        .ok_or_else(|| ApiError::not_found(&uri))?;

    Ok(Json(document))
}

/// Get stats endpoint
pub async fn get_stats(
    State(registry): State<Arc<RegistryManager>>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = registry.get_stats().await?;
    Ok(Json(StatsResponse { stats }))
}
