//! API request structures
//!
//! This module contains the request structures for the API endpoints.
//! Entity creation takes a bare JSON array of documents, so the only
//! named structure here is the list query.

use serde::Deserialize;

/// Query parameters for listing entities
#[derive(Debug, Default, Deserialize)]
pub struct ListEntitiesQuery {
    /// Restrict the listing to one specific namespace collection
    pub namespace: Option<String>,
}
