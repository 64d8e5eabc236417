//! Entity schema variants
//!
//! The four supported shapes of a SOFT/DLite entity document, the shared
//! identity invariants, and the ordered resolver that decides which shape a
//! raw document takes.

pub mod dlite;
pub mod identity;
pub mod resolve;
pub mod soft5;
pub mod soft7;

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::{RegistryError, RegistryResult};
use crate::uri::compose;
use crate::version::SemanticVersion;

pub use dlite::{DliteSoft5Entity, DliteSoft7Entity, DLITE_ENTITY_SCHEMA_URI};
pub use resolve::{resolve_entity, try_resolve_entity, VariantError};
pub use soft5::Soft5Entity;
pub use soft7::Soft7Entity;

/// The supported schema variants, in resolution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityVariant {
    /// Plain map-style (SOFT7)
    Soft7,
    /// Plain list-style (SOFT5)
    Soft5,
    /// DLite map-style
    DliteSoft7,
    /// DLite list-style
    DliteSoft5,
}

impl fmt::Display for EntityVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EntityVariant::Soft7 => "SOFT7",
            EntityVariant::Soft5 => "SOFT5",
            EntityVariant::DliteSoft7 => "DLite SOFT7",
            EntityVariant::DliteSoft5 => "DLite SOFT5",
        };
        write!(f, "{}", text)
    }
}

/// A fully validated entity, one of the four schema variants
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// Plain map-style
    Soft7(Soft7Entity),
    /// Plain list-style
    Soft5(Soft5Entity),
    /// DLite map-style
    DliteSoft7(DliteSoft7Entity),
    /// DLite list-style
    DliteSoft5(DliteSoft5Entity),
}

impl Entity {
    /// Which schema variant this entity resolved to
    pub fn variant(&self) -> EntityVariant {
        match self {
            Entity::Soft7(_) => EntityVariant::Soft7,
            Entity::Soft5(_) => EntityVariant::Soft5,
            Entity::DliteSoft7(_) => EntityVariant::DliteSoft7,
            Entity::DliteSoft5(_) => EntityVariant::DliteSoft5,
        }
    }

    /// Canonical identity URI
    pub fn uri(&self) -> &str {
        match self {
            Entity::Soft7(e) => &e.uri,
            Entity::Soft5(e) => &e.uri,
            Entity::DliteSoft7(e) => &e.uri,
            Entity::DliteSoft5(e) => &e.uri,
        }
    }

    /// Entity name
    pub fn name(&self) -> &str {
        match self {
            Entity::Soft7(e) => &e.name,
            Entity::Soft5(e) => &e.name,
            Entity::DliteSoft7(e) => &e.name,
            Entity::DliteSoft5(e) => &e.name,
        }
    }

    /// Version string, verbatim as validated
    pub fn version_str(&self) -> &str {
        match self {
            Entity::Soft7(e) => &e.version,
            Entity::Soft5(e) => &e.version,
            Entity::DliteSoft7(e) => &e.version,
            Entity::DliteSoft5(e) => &e.version,
        }
    }

    /// Full namespace
    pub fn namespace(&self) -> &str {
        match self {
            Entity::Soft7(e) => &e.namespace,
            Entity::Soft5(e) => &e.namespace,
            Entity::DliteSoft7(e) => &e.namespace,
            Entity::DliteSoft5(e) => &e.namespace,
        }
    }

    /// Parsed version
    pub fn version(&self) -> RegistryResult<SemanticVersion> {
        self.version_str().parse()
    }

    /// Canonicalized wire representation: aliased keys (`$ref`, `shape`),
    /// `identity` normalized away, unset optional fields excluded.
    ///
    /// This is the representation used for structural equality during
    /// conflict resolution and for storage.
    pub fn to_canonical_value(&self) -> RegistryResult<Value> {
        let value = match self {
            Entity::Soft7(e) => serde_json::to_value(e),
            Entity::Soft5(e) => serde_json::to_value(e),
            Entity::DliteSoft7(e) => serde_json::to_value(e),
            Entity::DliteSoft5(e) => serde_json::to_value(e),
        };
        value.map_err(RegistryError::from)
    }

    /// Produce a copy with `version` and `uri` rewritten together.
    ///
    /// The two fields are never updated independently: the new URI is
    /// recomposed from the unchanged namespace and name plus the new
    /// version.
    pub fn with_version(&self, version: &SemanticVersion) -> Entity {
        let version_text = version.to_string();
        let mut updated = self.clone();
        match &mut updated {
            Entity::Soft7(e) => {
                e.uri = compose(&e.namespace, &version_text, &e.name);
                e.version = version_text;
            }
            Entity::Soft5(e) => {
                e.uri = compose(&e.namespace, &version_text, &e.name);
                e.version = version_text;
            }
            Entity::DliteSoft7(e) => {
                e.uri = compose(&e.namespace, &version_text, &e.name);
                e.version = version_text;
            }
            Entity::DliteSoft5(e) => {
                e.uri = compose(&e.namespace, &version_text, &e.name);
                e.version = version_text;
            }
        }
        updated
    }
}
