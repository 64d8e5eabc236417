//! SOFT5 (list-style) entity variant
//!
//! Dimensions and properties are ordered sequences of named records.

use serde::{Deserialize, Serialize};

/// List-style entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Soft5Entity {
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

    /// Ordered dimension records
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimensions: Vec<Soft5Dimension>,

    /// Ordered property records
    pub properties: Vec<Soft5Property>,
}

/// Named dimension record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Soft5Dimension {
    /// Dimension name
    pub name: String,

    /// Human-readable description
    pub description: String,
}

/// List-style property record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Soft5Property {
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

    /// Human-readable description (required)
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserializes_list_style_document() {
        let entity: Soft5Entity = serde_json::from_value(json!({
            "uri": "http://onto-ns.com/meta/0.1/Person",
            "name": "Person",
            "version": "0.1",
            "namespace": "http://onto-ns.com/meta",
            "dimensions": [{"name": "n", "description": "number of skills"}],
            "properties": [
                {"name": "age", "type": "int", "description": "age"},
                {"name": "skills", "type": "string", "dims": ["n"], "description": "skills"},
            ],
        }))
        .unwrap();

        assert_eq!(entity.properties.len(), 2);
        assert_eq!(entity.properties[0].name, "age");
        assert_eq!(entity.properties[1].shape.as_deref(), Some(&["n".to_string()][..]));
    }

    #[test]
    fn test_property_order_is_preserved() {
        let entity: Soft5Entity = serde_json::from_value(json!({
            "uri": "http://onto-ns.com/meta/0.1/Person",
            "name": "Person",
            "version": "0.1",
            "namespace": "http://onto-ns.com/meta",
            "properties": [
                {"name": "b", "type": "int", "description": "b"},
                {"name": "a", "type": "int", "description": "a"},
            ],
        }))
        .unwrap();

        let names: Vec<&str> = entity.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn test_rejects_map_style_properties() {
        let result: Result<Soft5Entity, _> = serde_json::from_value(json!({
            "uri": "http://onto-ns.com/meta/0.1/Person",
            "name": "Person",
            "version": "0.1",
            "namespace": "http://onto-ns.com/meta",
            "properties": {"age": {"type": "int", "description": "age"}},
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unnamed_dimension() {
        let result: Result<Soft5Dimension, _> =
            serde_json::from_value(json!({"description": "no name"}));
        assert!(result.is_err());
    }
}
