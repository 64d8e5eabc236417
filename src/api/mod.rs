//! HTTP API for the Entity Registry
//!
//! This module contains the API server, endpoint handlers, and the
//! request/response structures.

pub mod endpoints;
pub mod error;
pub mod requests;
pub mod responses;
pub mod server;

pub use error::ApiError;
pub use server::EntityRegistryApi;
