//! SOFT7 (map-style) entity variant
//!
//! Dimensions are a name -> description mapping and properties a
//! name -> record mapping. Unknown fields are rejected, which is what
//! keeps this variant from swallowing DLite documents (their `meta` key
//! fails here and falls through to the DLite variants).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Map-style entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Soft7Entity {
    /// Canonical identity, `{namespace}/{version}/{name}`
    pub uri: String,

    /// Entity name
    pub name: String,

    /// Entity version
    pub version: String,

    /// Full namespace, including the base URL
    pub namespace: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Dimension name -> description
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub dimensions: HashMap<String, String>,

    /// Property name -> record
    pub properties: HashMap<String, Soft7Property>,
}

/// Map-style property record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Soft7Property {
    /// The described value's primitive or reference type
    #[serde(rename = "type")]
    pub data_type: String,

    /// Dimension expressions, `dims` accepted as a legacy input alias
    #[serde(default, alias = "dims", skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<String>>,

    /// Physical unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Human-readable description (required)
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserializes_map_style_document() {
        let entity: Soft7Entity = serde_json::from_value(json!({
            "uri": "http://onto-ns.com/meta/0.1/Person",
            "name": "Person",
            "version": "0.1",
            "namespace": "http://onto-ns.com/meta",
            "dimensions": {"n": "number of skills"},
            "properties": {
                "age": {"type": "int", "description": "age", "unit": "years"},
                "skills": {"type": "string", "shape": ["n"], "description": "skills"},
            },
        }))
        .unwrap();

        assert_eq!(entity.name, "Person");
        assert_eq!(entity.properties["age"].data_type, "int");
        assert_eq!(entity.properties["skills"].shape.as_deref(), Some(&["n".to_string()][..]));
    }

    #[test]
    fn test_dims_alias_is_accepted_and_written_back_as_shape() {
        let property: Soft7Property = serde_json::from_value(json!({
            "type": "float",
            "dims": ["n"],
            "description": "values",
        }))
        .unwrap();
        assert_eq!(property.shape.as_deref(), Some(&["n".to_string()][..]));

        let dumped = serde_json::to_value(&property).unwrap();
        assert_eq!(dumped["shape"], json!(["n"]));
        assert!(dumped.get("dims").is_none());
    }

    #[test]
    fn test_rejects_meta_field() {
        let result: Result<Soft7Entity, _> = serde_json::from_value(json!({
            "uri": "http://onto-ns.com/meta/0.1/Person",
            "name": "Person",
            "version": "0.1",
            "namespace": "http://onto-ns.com/meta",
            "meta": "http://onto-ns.com/meta/0.3/EntitySchema",
            "properties": {"age": {"type": "int", "description": "age"}},
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_property_without_description() {
        let result: Result<Soft7Property, _> =
            serde_json::from_value(json!({"type": "int"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_ref_on_plain_property() {
        let result: Result<Soft7Property, _> = serde_json::from_value(json!({
            "type": "ref",
            "description": "link",
            "$ref": "http://onto-ns.com/meta/0.1/Other",
        }));
        assert!(result.is_err());
    }
}
