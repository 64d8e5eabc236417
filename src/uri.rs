//! Entity URI grammar
//!
//! Bidirectional mapping between a `(namespace, version, name)` triple and
//! the canonical URI string `{namespace}/{version}/{name}`. All parsing is
//! parameterized by the service's configured base URL.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{RegistryError, RegistryResult};
use crate::version::{SemanticVersion, SEMVER_FRAGMENT};

/// Characters that may not appear in an entity name
const FORBIDDEN_NAME_CHARS: &[char] = &['/', '?', '#', '@', ':'];

/// Grammar for URIs outside the service's own namespace. The namespace is
/// opaque here: no specific-namespace suffix can be recovered.
static GENERIC_URI_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<namespace>.+)/(?P<version>{})/(?P<name>[^/#?]+)$",
        SEMVER_FRAGMENT
    ))
    .expect("generic URI pattern is valid")
});

/// Decomposed canonical entity identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityUri {
    /// Full namespace, including the base URL prefix
    pub namespace: String,

    /// Namespace suffix after the base URL; `None` for the core namespace
    /// and for generic (non-service) URIs
    pub specific_namespace: Option<String>,

    /// Version segment, kept verbatim
    pub version: String,

    /// Entity name segment
    pub name: String,
}

impl EntityUri {
    /// The collection an entity belongs to, derived from its specific
    /// namespace. The core namespace maps to the default collection.
    pub fn collection(&self) -> String {
        match &self.specific_namespace {
            Some(specific) => specific.clone(),
            None => "entities".to_string(),
        }
    }
}

impl fmt::Display for EntityUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", compose(&self.namespace, &self.version, &self.name))
    }
}

/// Compose the canonical URI string from a decomposed triple.
///
/// Inverse of [`UriGrammar::parse`]: `parse(compose(triple)) == triple` for
/// all valid inputs.
pub fn compose(namespace: &str, version: &str, name: &str) -> String {
    format!("{}/{}/{}", namespace, version, name)
}

/// Check the character constraints on an entity name.
///
/// Names must be URL-safe: printable ASCII without `/ ? # @ :` or
/// whitespace.
pub fn validate_name(name: &str) -> RegistryResult<()> {
    if name.is_empty() {
        return Err(RegistryError::invalid_uri("entity name is empty"));
    }

    for c in name.chars() {
        if FORBIDDEN_NAME_CHARS.contains(&c) {
            return Err(RegistryError::invalid_uri(format!(
                "entity name '{}' contains forbidden character '{}'",
                name, c
            )));
        }
        if !c.is_ascii_graphic() {
            return Err(RegistryError::invalid_uri(format!(
                "entity name '{}' is not URL-safe",
                name
            )));
        }
    }

    Ok(())
}

/// Check the reserved collection-name constraints on a namespace.
pub fn validate_namespace(namespace: &str, specific_namespace: Option<&str>) -> RegistryResult<()> {
    if namespace.contains('$') {
        return Err(RegistryError::invalid_uri(format!(
            "namespace '{}' contains '$'",
            namespace
        )));
    }
    if namespace.contains(char::is_whitespace) {
        return Err(RegistryError::invalid_uri(format!(
            "namespace '{}' contains whitespace",
            namespace
        )));
    }
    if let Some(specific) = specific_namespace {
        if specific.starts_with("system.") {
            return Err(RegistryError::invalid_uri(format!(
                "namespace '{}' starts with reserved prefix 'system.'",
                specific
            )));
        }
    }

    Ok(())
}

/// URI parser bound to a configured base URL
#[derive(Debug, Clone)]
pub struct UriGrammar {
    /// The service base URL, no trailing slash
    base_url: String,

    /// Service-namespace pattern
    pattern: Regex,
}

impl UriGrammar {
    /// Build the grammar for a base URL.
    ///
    /// Fails if the base URL is not an absolute HTTP(S) URL or carries a
    /// trailing slash.
    pub fn new(base_url: &str) -> RegistryResult<Self> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(RegistryError::config(&format!(
                "base URL '{}' is not an absolute HTTP(S) URL",
                base_url
            )));
        }
        if base_url.ends_with('/') {
            return Err(RegistryError::config(&format!(
                "base URL '{}' must not end with '/'",
                base_url
            )));
        }

        let pattern = Regex::new(&format!(
            r"^(?P<namespace>{}(?:/(?P<specific_namespace>.+))?)/(?P<version>{})/(?P<name>[^/#?]+)$",
            regex::escape(base_url),
            SEMVER_FRAGMENT
        ))
        .map_err(|e| RegistryError::config(&format!("cannot build URI pattern: {}", e)))?;

        Ok(Self {
            base_url: base_url.to_string(),
            pattern,
        })
    }

    /// The base URL this grammar was built for
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Parse a full URI string into its decomposed identity.
    ///
    /// A non-match is an error: callers must treat it as "invalid URI", not
    /// silently fall back.
    pub fn parse(&self, uri: &str) -> RegistryResult<EntityUri> {
        let captures = self.pattern.captures(uri).ok_or_else(|| {
            RegistryError::invalid_uri(format!(
                "'{}' does not match {}[/{{namespace}}]/{{version}}/{{name}}",
                uri, self.base_url
            ))
        })?;

        let namespace = captures["namespace"].to_string();
        let specific_namespace = captures
            .name("specific_namespace")
            .map(|m| m.as_str().to_string());
        let version = captures["version"].to_string();
        let name = captures["name"].to_string();

        SemanticVersion::validate(&version)?;
        validate_name(&name)?;
        validate_namespace(&namespace, specific_namespace.as_deref())?;

        Ok(EntityUri {
            namespace,
            specific_namespace,
            version,
            name,
        })
    }

    /// Compose and fully validate a URI from a triple.
    pub fn compose_checked(
        &self,
        namespace: &str,
        version: &str,
        name: &str,
    ) -> RegistryResult<EntityUri> {
        self.parse(&compose(namespace, version, name))
    }
}

/// Parse a URI that need not belong to the service's namespace.
///
/// Interop escape hatch for external references (e.g. DLite `meta` and
/// property `$ref` values): the namespace is opaque, so no specific
/// namespace is recovered.
pub fn parse_generic(uri: &str) -> RegistryResult<EntityUri> {
    let captures = GENERIC_URI_REGEX.captures(uri).ok_or_else(|| {
        RegistryError::invalid_uri(format!(
            "'{}' does not match {{namespace}}/{{version}}/{{name}}",
            uri
        ))
    })?;

    let namespace = captures["namespace"].to_string();
    let version = captures["version"].to_string();
    let name = captures["name"].to_string();

    SemanticVersion::validate(&version)?;
    validate_name(&name)?;

    Ok(EntityUri {
        namespace,
        specific_namespace: None,
        version,
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://onto-ns.com/meta";

    fn grammar() -> UriGrammar {
        UriGrammar::new(BASE).unwrap()
    }

    #[test]
    fn test_parse_core_namespace() {
        let uri = grammar().parse("http://onto-ns.com/meta/0.1/Person").unwrap();
        assert_eq!(uri.namespace, "http://onto-ns.com/meta");
        assert_eq!(uri.specific_namespace, None);
        assert_eq!(uri.version, "0.1");
        assert_eq!(uri.name, "Person");
    }

    #[test]
    fn test_parse_specific_namespace() {
        let uri = grammar()
            .parse("http://onto-ns.com/meta/materials/1.2.3/Alloy")
            .unwrap();
        assert_eq!(uri.namespace, "http://onto-ns.com/meta/materials");
        assert_eq!(uri.specific_namespace.as_deref(), Some("materials"));
        assert_eq!(uri.version, "1.2.3");
        assert_eq!(uri.name, "Alloy");
        assert_eq!(uri.collection(), "materials");
    }

    #[test]
    fn test_parse_compose_round_trip() {
        let texts = [
            "http://onto-ns.com/meta/0.1/Person",
            "http://onto-ns.com/meta/materials/1.2.3/Alloy",
            "http://onto-ns.com/meta/a/b/2/Thing",
        ];
        for text in texts {
            let uri = grammar().parse(text).unwrap();
            assert_eq!(
                compose(&uri.namespace, &uri.version, &uri.name),
                text,
                "round trip for '{}'",
                text
            );
        }
    }

    #[test]
    fn test_rejects_foreign_base_url() {
        let result = grammar().parse("http://example.com/0.1/Person");
        assert!(matches!(result, Err(RegistryError::InvalidUri { .. })));
    }

    #[test]
    fn test_rejects_missing_segments() {
        for text in [
            "http://onto-ns.com/meta/Person",
            "http://onto-ns.com/meta/0.1",
            "http://onto-ns.com/meta//0.1/Person",
            "not a uri at all",
        ] {
            assert!(grammar().parse(text).is_err(), "'{}' should be rejected", text);
        }
    }

    #[test]
    fn test_name_constraints() {
        assert!(validate_name("Person").is_ok());
        assert!(validate_name("Person-2_x.y").is_ok());

        for bad in ["", "a b", "a/b", "a?b", "a#b", "a@b", "a:b", "h\u{e9}llo"] {
            assert!(validate_name(bad).is_err(), "'{}' should be rejected", bad);
        }
    }

    #[test]
    fn test_namespace_collection_constraints() {
        assert!(validate_namespace("http://onto-ns.com/meta", None).is_ok());
        assert!(validate_namespace("http://onto-ns.com/meta/materials", Some("materials")).is_ok());

        assert!(validate_namespace("http://onto-ns.com/me$ta", None).is_err());
        assert!(validate_namespace("http://onto-ns.com/me ta", None).is_err());
        assert!(
            validate_namespace("http://onto-ns.com/meta/system.x", Some("system.x")).is_err()
        );
    }

    #[test]
    fn test_generic_parse_keeps_namespace_opaque() {
        let uri = parse_generic("http://example.org/other/0.3/EntitySchema").unwrap();
        assert_eq!(uri.namespace, "http://example.org/other");
        assert_eq!(uri.specific_namespace, None);
        assert_eq!(uri.version, "0.3");
        assert_eq!(uri.name, "EntitySchema");
    }

    #[test]
    fn test_grammar_rejects_bad_base_url() {
        assert!(UriGrammar::new("onto-ns.com/meta").is_err());
        assert!(UriGrammar::new("http://onto-ns.com/meta/").is_err());
    }

    #[test]
    fn test_grammar_is_rederivable_for_other_base_urls() {
        let other = UriGrammar::new("https://example.org/schemas").unwrap();
        let uri = other.parse("https://example.org/schemas/0.1/Person").unwrap();
        assert_eq!(uri.namespace, "https://example.org/schemas");
        assert!(other.parse("http://onto-ns.com/meta/0.1/Person").is_err());
    }
}
