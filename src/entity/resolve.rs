//! Entity resolution
//!
//! Given an arbitrary field mapping, try each schema variant in a fixed
//! priority order and return the first that constructs successfully. The
//! order is load-bearing: plain variants come before DLite variants, and
//! map-style before list-style. A variant mismatch is not an error that
//! escapes — it is collected and the next candidate is tried; only when
//! all four fail does anything propagate.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{RegistryError, RegistryResult};
use crate::uri::UriGrammar;

use super::{dlite, identity, Entity, EntityVariant};

/// A single variant's construction failure, collected during resolution
#[derive(Debug, Clone, Serialize)]
pub struct VariantError {
    /// The variant that failed to construct
    pub variant: EntityVariant,

    /// Why it failed
    pub message: String,
}

impl fmt::Display for VariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.variant, self.message)
    }
}

/// A candidate parser: a pure function from a raw mapping to an entity.
type Candidate = fn(Map<String, Value>, &UriGrammar) -> RegistryResult<Entity>;

/// The candidate list, in resolution priority order.
const CANDIDATES: [(EntityVariant, Candidate); 4] = [
    (EntityVariant::Soft7, parse_soft7),
    (EntityVariant::Soft5, parse_soft5),
    (EntityVariant::DliteSoft7, parse_dlite_soft7),
    (EntityVariant::DliteSoft5, parse_dlite_soft5),
];

fn parse_soft7(map: Map<String, Value>, _grammar: &UriGrammar) -> RegistryResult<Entity> {
    let entity: super::Soft7Entity = serde_json::from_value(Value::Object(map))?;
    Ok(Entity::Soft7(entity))
}

fn parse_soft5(map: Map<String, Value>, _grammar: &UriGrammar) -> RegistryResult<Entity> {
    let entity: super::Soft5Entity = serde_json::from_value(Value::Object(map))?;
    Ok(Entity::Soft5(entity))
}

fn parse_dlite_soft7(map: Map<String, Value>, _grammar: &UriGrammar) -> RegistryResult<Entity> {
    let mut entity: super::DliteSoft7Entity = serde_json::from_value(Value::Object(map))?;
    entity.meta = dlite::normalize_meta(&entity.meta)?;
    dlite::validate_refs(
        entity
            .properties
            .values()
            .map(|p| p.entity_ref.as_deref()),
    )?;
    Ok(Entity::DliteSoft7(entity))
}

fn parse_dlite_soft5(map: Map<String, Value>, _grammar: &UriGrammar) -> RegistryResult<Entity> {
    let mut entity: super::DliteSoft5Entity = serde_json::from_value(Value::Object(map))?;
    entity.meta = dlite::normalize_meta(&entity.meta)?;
    dlite::validate_refs(entity.properties.iter().map(|p| p.entity_ref.as_deref()))?;
    Ok(Entity::DliteSoft5(entity))
}

/// Resolve a raw document into an entity, returning the per-variant errors
/// when no variant matches.
///
/// Resolution is idempotent: the same input yields the same variant with
/// the same field values.
pub fn try_resolve_entity(
    document: &Value,
    grammar: &UriGrammar,
) -> Result<Entity, Vec<VariantError>> {
    let map = match document.as_object() {
        Some(map) => map.clone(),
        None => {
            return Err(CANDIDATES
                .iter()
                .map(|(variant, _)| VariantError {
                    variant: *variant,
                    message: "document is not a mapping".to_string(),
                })
                .collect());
        }
    };

    // Identity invariants are shared by every variant; run them once on the
    // raw mapping before any per-field coercion.
    let mut normalized = map;
    if let Err(err) = identity::normalize_identity(&mut normalized, grammar) {
        return Err(CANDIDATES
            .iter()
            .map(|(variant, _)| VariantError {
                variant: *variant,
                message: err.to_string(),
            })
            .collect());
    }

    let mut errors = Vec::with_capacity(CANDIDATES.len());
    for (variant, candidate) in CANDIDATES {
        match candidate(normalized.clone(), grammar) {
            Ok(entity) => return Ok(entity),
            Err(err) => errors.push(VariantError {
                variant,
                message: err.to_string(),
            }),
        }
    }

    Err(errors)
}

/// Resolve a raw document into an entity, aggregating all variant failures
/// into a single error.
pub fn resolve_entity(document: &Value, grammar: &UriGrammar) -> RegistryResult<Entity> {
    try_resolve_entity(document, grammar)
        .map_err(|errors| RegistryError::NoMatchingVariant { errors })
}
