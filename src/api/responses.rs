//! API response structures
//!
//! This module contains all the response structures for the API endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::RegistryStats;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status
    pub status: String,

    /// Response timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Whether registry is initialized
    pub initialized: bool,

    /// Last health check timestamp
    pub last_health_check: chrono::DateTime<chrono::Utc>,
}

/// Create entities response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEntitiesResponse {
    /// Canonical URIs of the created entities
    pub created: Vec<String>,

    /// Number of entities created
    pub count: usize,
}

/// List entities response
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEntitiesResponse {
    /// Stored entity documents
    pub entities: Vec<Value>,

    /// Total count
    pub total_count: usize,
}

/// Stats response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Registry statistics
    pub stats: RegistryStats,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type
    pub error: String,

    /// Error message
    pub message: String,

    /// HTTP status code
    pub status_code: u16,
}
