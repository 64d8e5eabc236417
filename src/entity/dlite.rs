//! DLite-flavored entity variants
//!
//! Same shapes as the plain SOFT7/SOFT5 variants, plus a required `meta`
//! field pinned to the EntitySchema v0.3 URI and an optional `$ref` on
//! each property pointing at another entity's URI.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};
use crate::uri;

/// The one metaschema URI DLite entities may declare
pub const DLITE_ENTITY_SCHEMA_URI: &str = "http://onto-ns.com/meta/0.3/EntitySchema";

/// Check a `meta` value against the fixed EntitySchema literal. A trailing
/// slash is tolerated on input; the normalized form is returned.
pub fn normalize_meta(meta: &str) -> RegistryResult<String> {
    if meta.trim_end_matches('/') == DLITE_ENTITY_SCHEMA_URI {
        Ok(DLITE_ENTITY_SCHEMA_URI.to_string())
    } else {
        Err(RegistryError::invalid_request(&format!(
            "'meta' must be '{}', got '{}'",
            DLITE_ENTITY_SCHEMA_URI, meta
        )))
    }
}

/// DLite map-style entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DliteSoft7Entity {
    /// Canonical identity, `{namespace}/{version}/{name}`
    pub uri: String,

    /// Entity name
    pub name: String,

    /// Entity version
    pub version: String,

    /// Full namespace, including the base URL
    pub namespace: String,

    /// Metaschema URI, always [`DLITE_ENTITY_SCHEMA_URI`]
    pub meta: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Dimension name -> description
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub dimensions: HashMap<String, String>,

    /// Property name -> record
    pub properties: HashMap<String, DliteSoft7Property>,
}

/// DLite map-style property record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DliteSoft7Property {
    /// The described value's primitive or reference type
    #[serde(rename = "type")]
    pub data_type: String,

    /// Dimension expressions, `dims` accepted as a legacy input alias
    #[serde(default, alias = "dims", skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<String>>,

    /// Physical unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// URI of the referenced entity, wire key `$ref`
    #[serde(
        default,
        rename = "$ref",
        skip_serializing_if = "Option::is_none"
    )]
    pub entity_ref: Option<String>,

    /// Human-readable description (required)
    pub description: String,
}

/// DLite list-style entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DliteSoft5Entity {
    /// Canonical identity, `{namespace}/{version}/{name}`
    pub uri: String,

    /// Entity name
    pub name: String,

    /// Entity version
    pub version: String,

    /// Full namespace, including the base URL
    pub namespace: String,

    /// Metaschema URI, always [`DLITE_ENTITY_SCHEMA_URI`]
    pub meta: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Ordered dimension records
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<super::soft5::Soft5Dimension>,

    /// Ordered property records
    pub properties: Vec<DliteSoft5Property>,
}

/// DLite list-style property record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DliteSoft5Property {
    /// Property name
    pub name: String,

    /// The described value's primitive or reference type
    #[serde(rename = "type")]
    pub data_type: String,

    /// Dimension expressions, `dims` accepted as a legacy input alias
    #[serde(default, alias = "dims", skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<String>>,

    /// Physical unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// URI of the referenced entity, wire key `$ref`
    #[serde(
        default,
        rename = "$ref",
        skip_serializing_if = "Option::is_none"
    )]
    pub entity_ref: Option<String>,

    /// Human-readable description (required)
    pub description: String,
}

/// Check that every `$ref` value parses as an entity URI.
pub fn validate_refs<'a, I: IntoIterator<Item = Option<&'a str>>>(refs: I) -> RegistryResult<()> {
    for entity_ref in refs.into_iter().flatten() {
        uri::parse_generic(entity_ref)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_meta_literal_with_and_without_trailing_slash() {
        assert_eq!(
            normalize_meta("http://onto-ns.com/meta/0.3/EntitySchema").unwrap(),
            DLITE_ENTITY_SCHEMA_URI
        );
        assert_eq!(
            normalize_meta("http://onto-ns.com/meta/0.3/EntitySchema/").unwrap(),
            DLITE_ENTITY_SCHEMA_URI
        );

        assert!(normalize_meta("http://onto-ns.com/meta/0.2/EntitySchema").is_err());
        assert!(normalize_meta("http://example.com/meta/0.3/EntitySchema").is_err());
    }

    #[test]
    fn test_ref_round_trips_through_dollar_key() {
        let property: DliteSoft7Property = serde_json::from_value(json!({
            "type": "ref",
            "description": "link to another entity",
            "$ref": "http://onto-ns.com/meta/0.1/Other",
        }))
        .unwrap();
        assert_eq!(
            property.entity_ref.as_deref(),
            Some("http://onto-ns.com/meta/0.1/Other")
        );

        let dumped = serde_json::to_value(&property).unwrap();
        assert_eq!(dumped["$ref"], json!("http://onto-ns.com/meta/0.1/Other"));
        assert!(dumped.get("entity_ref").is_none());
        assert!(dumped.get("ref").is_none());
    }

    #[test]
    fn test_deserializes_dlite_list_style_document() {
        let entity: DliteSoft5Entity = serde_json::from_value(json!({
            "uri": "http://onto-ns.com/meta/0.1/Person",
            "name": "Person",
            "version": "0.1",
            "namespace": "http://onto-ns.com/meta",
            "meta": "http://onto-ns.com/meta/0.3/EntitySchema",
            "properties": [
                {"name": "friend", "type": "ref", "description": "a friend",
                 "$ref": "http://onto-ns.com/meta/0.1/Person"},
            ],
        }))
        .unwrap();
        assert_eq!(entity.properties[0].name, "friend");
    }

    #[test]
    fn test_validate_refs() {
        assert!(validate_refs([Some("http://onto-ns.com/meta/0.1/Other"), None]).is_ok());
        assert!(validate_refs([Some("not-a-uri")]).is_err());
    }
}
