//! Raw-mapping identity checks
//!
//! Phase one of entity construction: invariants over the untyped input
//! mapping, shared by all schema variants and applied before any per-field
//! deserialization. Operates on a plain `serde_json` object so it stays
//! reusable and testable on its own.

use serde_json::{Map, Value};

use crate::error::{RegistryError, RegistryResult};
use crate::uri::{compose, EntityUri, UriGrammar};
use crate::version::SemanticVersion;

/// Legacy input alias for `uri`
const IDENTITY_ALIAS: &str = "identity";

fn string_field<'a>(map: &'a Map<String, Value>, key: &str) -> RegistryResult<Option<&'a str>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(RegistryError::invalid_request(&format!(
            "field '{}' must be a string, got {}",
            key,
            value_kind(other)
        ))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Check and normalize the identity fields of a raw entity mapping.
///
/// Enforces, in order:
/// - the `identity` alias is folded into `uri` (differing values are an
///   error, not a silent preference),
/// - `name`, `version`, `namespace` are all present or all absent,
/// - a present `uri` matches the URI grammar and, when the triple is also
///   present, equals `{namespace}/{version}/{name}` exactly,
/// - the missing side (uri or triple) is derived from the other.
///
/// On success the mapping carries a consistent `uri` plus full triple, and
/// the decomposed identity is returned.
pub fn normalize_identity(
    map: &mut Map<String, Value>,
    grammar: &UriGrammar,
) -> RegistryResult<EntityUri> {
    // Fold the legacy alias first so the rest only ever sees `uri`.
    if let Some(identity) = map.remove(IDENTITY_ALIAS) {
        match map.get("uri") {
            None | Some(Value::Null) => {
                map.insert("uri".to_string(), identity);
            }
            Some(existing) if *existing == identity => {}
            Some(existing) => {
                return Err(RegistryError::invalid_uri(format!(
                    "'identity' ({}) and 'uri' ({}) disagree",
                    identity, existing
                )));
            }
        }
    }

    let uri = string_field(map, "uri")?.map(str::to_string);
    let name = string_field(map, "name")?.map(str::to_string);
    let version = string_field(map, "version")?.map(str::to_string);
    let namespace = string_field(map, "namespace")?.map(str::to_string);

    let triple = match (name, version, namespace) {
        (Some(name), Some(version), Some(namespace)) => Some((name, version, namespace)),
        (None, None, None) => None,
        _ => {
            return Err(RegistryError::invalid_request(
                "'name', 'version' and 'namespace' must either all be set or all be unset",
            ));
        }
    };

    let identity = match (uri, triple) {
        (None, None) => {
            return Err(RegistryError::invalid_request(
                "either 'uri' or the full ('name', 'version', 'namespace') triple is required",
            ));
        }
        (None, Some((name, version, namespace))) => {
            SemanticVersion::validate(&version)?;
            grammar.compose_checked(&namespace, &version, &name)?
        }
        (Some(uri), None) => grammar.parse(&uri)?,
        (Some(uri), Some((name, version, namespace))) => {
            let parsed = grammar.parse(&uri)?;
            let composed = compose(&namespace, &version, &name);
            if composed != uri {
                return Err(RegistryError::invalid_uri(format!(
                    "'uri' ({}) does not equal '{{namespace}}/{{version}}/{{name}}' ({})",
                    uri, composed
                )));
            }
            parsed
        }
    };

    map.insert("uri".to_string(), Value::String(identity.to_string()));
    map.insert("name".to_string(), Value::String(identity.name.clone()));
    map.insert(
        "version".to_string(),
        Value::String(identity.version.clone()),
    );
    map.insert(
        "namespace".to_string(),
        Value::String(identity.namespace.clone()),
    );

    Ok(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "http://onto-ns.com/meta";

    fn grammar() -> UriGrammar {
        UriGrammar::new(BASE).unwrap()
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_triple_derives_uri() {
        let mut map = object(json!({
            "namespace": "http://onto-ns.com/meta",
            "version": "0.1",
            "name": "Person",
        }));
        let identity = normalize_identity(&mut map, &grammar()).unwrap();
        assert_eq!(identity.to_string(), "http://onto-ns.com/meta/0.1/Person");
        assert_eq!(map["uri"], json!("http://onto-ns.com/meta/0.1/Person"));
    }

    #[test]
    fn test_uri_derives_triple() {
        let mut map = object(json!({"uri": "http://onto-ns.com/meta/materials/0.2/Alloy"}));
        normalize_identity(&mut map, &grammar()).unwrap();
        assert_eq!(map["name"], json!("Alloy"));
        assert_eq!(map["version"], json!("0.2"));
        assert_eq!(map["namespace"], json!("http://onto-ns.com/meta/materials"));
    }

    #[test]
    fn test_all_or_nothing_triple() {
        for partial in [
            json!({"uri": "http://onto-ns.com/meta/0.1/Person", "name": "Person"}),
            json!({"name": "Person", "version": "0.1"}),
            json!({"namespace": "http://onto-ns.com/meta"}),
        ] {
            let mut map = object(partial.clone());
            assert!(
                normalize_identity(&mut map, &grammar()).is_err(),
                "partial triple should be rejected: {}",
                partial
            );
        }
    }

    #[test]
    fn test_uri_triple_consistency() {
        let mut map = object(json!({
            "uri": "http://onto-ns.com/meta/0.2/Person",
            "namespace": "http://onto-ns.com/meta",
            "version": "0.1",
            "name": "Person",
        }));
        assert!(matches!(
            normalize_identity(&mut map, &grammar()),
            Err(RegistryError::InvalidUri { .. })
        ));

        let mut map = object(json!({
            "uri": "http://onto-ns.com/meta/0.1/Person",
            "namespace": "http://onto-ns.com/meta",
            "version": "0.1",
            "name": "Person",
        }));
        assert!(normalize_identity(&mut map, &grammar()).is_ok());
    }

    #[test]
    fn test_identity_alias_is_folded_into_uri() {
        let mut map = object(json!({"identity": "http://onto-ns.com/meta/0.1/Person"}));
        normalize_identity(&mut map, &grammar()).unwrap();
        assert!(!map.contains_key("identity"));
        assert_eq!(map["uri"], json!("http://onto-ns.com/meta/0.1/Person"));
    }

    #[test]
    fn test_disagreeing_identity_and_uri_is_an_error() {
        let mut map = object(json!({
            "identity": "http://onto-ns.com/meta/0.1/Person",
            "uri": "http://onto-ns.com/meta/0.2/Person",
        }));
        assert!(normalize_identity(&mut map, &grammar()).is_err());
    }

    #[test]
    fn test_missing_identity_entirely() {
        let mut map = object(json!({"description": "no identity at all"}));
        assert!(normalize_identity(&mut map, &grammar()).is_err());
    }

    #[test]
    fn test_non_string_identity_fields() {
        let mut map = object(json!({"uri": 42}));
        assert!(normalize_identity(&mut map, &grammar()).is_err());

        let mut map = object(json!({"name": 1, "version": "0.1", "namespace": BASE}));
        assert!(normalize_identity(&mut map, &grammar()).is_err());
    }
}
