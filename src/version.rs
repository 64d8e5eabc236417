//! Entity version management
//!
//! This module contains the [`SemanticVersion`] type used for entity
//! version fields. The grammar is a relaxed SemVer: only the major part
//! is required, minor and patch are optional, and prerelease/build
//! metadata are accepted.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// Relaxed SemVer pattern: MAJOR(.MINOR)?(.PATCH)?(-PRERELEASE)?(+BUILD)?
///
/// Kept group-free so it can be embedded into larger patterns (see the URI
/// grammar in [`crate::uri`]).
pub const SEMVER_FRAGMENT: &str = r"(?:0|[1-9]\d*)(?:\.(?:0|[1-9]\d*))?(?:\.(?:0|[1-9]\d*))?(?:-[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?(?:\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?";

static SEMVER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<major>0|[1-9]\d*)(?:\.(?P<minor>0|[1-9]\d*))?(?:\.(?P<patch>0|[1-9]\d*))?(?:-(?P<pre>[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?(?:\+(?P<build>[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?$",
    )
    .expect("semver pattern is valid")
});

/// Replacement versions accepted during conflict resolution are restricted
/// to plain numeric bumps: no prerelease or build metadata.
static PLAIN_BUMP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:\.\d+){0,2}$").expect("plain bump pattern is valid"));

/// Entity version under the relaxed SemVer grammar
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SemanticVersion {
    /// Major version
    pub major: u64,

    /// Minor version, absent in e.g. "1"
    pub minor: Option<u64>,

    /// Patch version, absent in e.g. "1.1"
    pub patch: Option<u64>,

    /// Pre-release identifier
    pub pre_release: Option<String>,

    /// Build metadata
    pub build: Option<String>,
}

impl SemanticVersion {
    /// Create a full numeric version
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor: Some(minor),
            patch: Some(patch),
            pre_release: None,
            build: None,
        }
    }

    /// Validate a version string against the relaxed grammar
    pub fn validate(version: &str) -> RegistryResult<()> {
        version.parse::<Self>().map(|_| ())
    }

    /// Check a string against the restricted replacement-version grammar
    /// (`MAJOR(.MINOR){0,2}`, digits only).
    ///
    /// Deliberately stricter than the grammar accepted by [`FromStr`]:
    /// replacement versions produced during conflict resolution are meant
    /// to be simple bumps.
    pub fn matches_plain_bump_grammar(version: &str) -> bool {
        PLAIN_BUMP_REGEX.is_match(version)
    }

    /// Compute the next version to propose when the current one conflicts.
    ///
    /// Policy:
    /// - `"1"` -> `"1.1"` (append minor)
    /// - `"1.1"` -> `"1.1.1"` (append patch)
    /// - `"1.1.1"` -> `"1.1.2"` (increment patch)
    ///
    /// Versions carrying prerelease or build metadata have no defined next
    /// shape and are rejected rather than guessed at.
    pub fn increment(&self) -> RegistryResult<Self> {
        if self.pre_release.is_some() || self.build.is_some() {
            return Err(RegistryError::invalid_version(format!(
                "cannot derive the next version from '{}': prerelease/build metadata present",
                self
            )));
        }

        let next = match (self.minor, self.patch) {
            (None, _) => Self {
                major: self.major,
                minor: Some(1),
                patch: None,
                pre_release: None,
                build: None,
            },
            (Some(minor), None) => Self {
                major: self.major,
                minor: Some(minor),
                patch: Some(1),
                pre_release: None,
                build: None,
            },
            (Some(minor), Some(patch)) => Self {
                major: self.major,
                minor: Some(minor),
                patch: Some(patch + 1),
                pre_release: None,
                build: None,
            },
        };

        Ok(next)
    }

    /// Precedence key: absent minor/patch count as zero, release versions
    /// outrank prereleases, build metadata is ignored.
    fn precedence_key(&self) -> (u64, u64, u64, bool, &str) {
        (
            self.major,
            self.minor.unwrap_or(0),
            self.patch.unwrap_or(0),
            self.pre_release.is_none(),
            self.pre_release.as_deref().unwrap_or(""),
        )
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.precedence_key() == other.precedence_key()
    }
}

impl Eq for SemanticVersion {}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.precedence_key().cmp(&other.precedence_key())
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major)?;

        if let Some(minor) = self.minor {
            write!(f, ".{}", minor)?;
        }

        if let Some(patch) = self.patch {
            write!(f, ".{}", patch)?;
        }

        if let Some(pre_release) = &self.pre_release {
            write!(f, "-{}", pre_release)?;
        }

        if let Some(build) = &self.build {
            write!(f, "+{}", build)?;
        }

        Ok(())
    }
}

impl FromStr for SemanticVersion {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = SEMVER_REGEX.captures(s).ok_or_else(|| {
            RegistryError::invalid_version(format!(
                "'{}' does not match MAJOR(.MINOR)?(.PATCH)?(-PRERELEASE)?(+BUILD)?",
                s
            ))
        })?;

        let parse_part = |name: &str| -> RegistryResult<Option<u64>> {
            captures
                .name(name)
                .map(|m| {
                    m.as_str().parse::<u64>().map_err(|_| {
                        RegistryError::invalid_version(format!(
                            "{} part of '{}' is out of range",
                            name, s
                        ))
                    })
                })
                .transpose()
        };

        Ok(Self {
            major: parse_part("major")?.ok_or_else(|| {
                RegistryError::invalid_version(format!("'{}' has no major part", s))
            })?,
            minor: parse_part("minor")?,
            patch: parse_part("patch")?,
            pre_release: captures.name("pre").map(|m| m.as_str().to_string()),
            build: captures.name("build").map(|m| m.as_str().to_string()),
        })
    }
}

impl TryFrom<String> for SemanticVersion {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SemanticVersion> for String {
    fn from(version: SemanticVersion) -> Self {
        version.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsing_round_trips_text() {
        for text in ["1", "1.1", "1.0", "1.1.1", "0.1", "2.0.0-rc.1", "1.0.0+build.5"] {
            let version: SemanticVersion = text.parse().unwrap();
            assert_eq!(version.to_string(), text);
        }
    }

    #[test]
    fn test_rejects_malformed_versions() {
        for text in ["", "01", "1.01", "1.2.3.4", "a.b.c", "1..2", "-1", "1.-2"] {
            assert!(
                text.parse::<SemanticVersion>().is_err(),
                "'{}' should be rejected",
                text
            );
        }
    }

    #[test]
    fn test_increment_policy() {
        let cases = [("1", "1.1"), ("1.1", "1.1.1"), ("1.0", "1.0.1"), ("1.1.1", "1.1.2"), ("1.0.0", "1.0.1")];
        for (from, to) in cases {
            let version: SemanticVersion = from.parse().unwrap();
            assert_eq!(version.increment().unwrap().to_string(), to);
        }
    }

    #[test]
    fn test_increment_rejects_prerelease_and_build() {
        let version: SemanticVersion = "1.0.0-rc.1".parse().unwrap();
        assert!(version.increment().is_err());

        let version: SemanticVersion = "1.0.0+build.5".parse().unwrap();
        assert!(version.increment().is_err());
    }

    #[test]
    fn test_increment_is_monotonic() {
        for text in ["1", "1.1", "1.0", "3.2.9", "0.1"] {
            let version: SemanticVersion = text.parse().unwrap();
            let next = version.increment().unwrap();
            assert_ne!(next, version, "increment of '{}' must differ", text);
            assert!(next > version, "increment of '{}' must rank higher", text);
            assert!(SemanticVersion::validate(&next.to_string()).is_ok());
        }
    }

    #[test]
    fn test_ordering_treats_absent_parts_as_zero() {
        let bare: SemanticVersion = "1".parse().unwrap();
        let padded: SemanticVersion = "1.0.0".parse().unwrap();
        assert_eq!(bare, padded);

        let bumped: SemanticVersion = "1.1".parse().unwrap();
        assert!(bumped > bare);
    }

    #[test]
    fn test_release_outranks_prerelease() {
        let release: SemanticVersion = "1.0.0".parse().unwrap();
        let prerelease: SemanticVersion = "1.0.0-alpha".parse().unwrap();
        assert!(release > prerelease);
    }

    // The replacement-version grammar is intentionally stricter than the
    // general version grammar: simple numeric bumps only.
    #[test]
    fn plain_bump_grammar_is_stricter_than_full() {
        assert!(SemanticVersion::matches_plain_bump_grammar("1"));
        assert!(SemanticVersion::matches_plain_bump_grammar("1.1"));
        assert!(SemanticVersion::matches_plain_bump_grammar("1.0.2"));

        // Accepted by the full grammar, rejected for replacements.
        assert!(SemanticVersion::validate("1.0.0-rc.1").is_ok());
        assert!(!SemanticVersion::matches_plain_bump_grammar("1.0.0-rc.1"));
        assert!(SemanticVersion::validate("1.0.0+build").is_ok());
        assert!(!SemanticVersion::matches_plain_bump_grammar("1.0.0+build"));

        assert!(!SemanticVersion::matches_plain_bump_grammar("1.2.3.4"));
        assert!(!SemanticVersion::matches_plain_bump_grammar("v1"));
    }

    #[test]
    fn test_serde_round_trip_as_string() {
        let version: SemanticVersion = "1.2.3-rc.1".parse().unwrap();
        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(json, "\"1.2.3-rc.1\"");

        let back: SemanticVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, version);
    }
}
