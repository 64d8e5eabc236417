//! Upload conflict resolution
//!
//! Decides what to do when a locally validated entity's URI already exists
//! remotely: skip on structural equality, otherwise propose a version bump
//! derived from the *remote* version and rewrite the local entity's
//! version and URI consistently once a replacement is accepted.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::entity::{resolve_entity, Entity};
use crate::error::{RegistryError, RegistryResult};
use crate::uri::UriGrammar;
use crate::version::SemanticVersion;

/// Per-entity conflict state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictState {
    /// No remote check has happened yet
    NotChecked,

    /// Remote store has no entity at this URI; safe to create
    CheckedAbsent,

    /// Remote entity exists and is structurally equal; upload is a no-op
    CheckedPresentEqual,

    /// Remote entity exists and differs; a replacement version is needed
    CheckedPresentDiffering,

    /// A replacement version was accepted but not yet revalidated
    VersionUpdateAccepted,

    /// The user declined to bump the version; entity is skipped
    VersionUpdateDeclined,

    /// Replacement revalidated; the rewritten entity may be uploaded
    ReadyToUpload,
}

impl fmt::Display for ConflictState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConflictState::NotChecked => "not checked",
            ConflictState::CheckedAbsent => "absent remotely",
            ConflictState::CheckedPresentEqual => "equal remotely",
            ConflictState::CheckedPresentDiffering => "differs remotely",
            ConflictState::VersionUpdateAccepted => "version update accepted",
            ConflictState::VersionUpdateDeclined => "version update declined",
            ConflictState::ReadyToUpload => "ready to upload",
        };
        write!(f, "{}", text)
    }
}

/// How two values differ at one path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    /// Present locally, absent remotely
    Added,
    /// Absent locally, present remotely
    Removed,
    /// Present on both sides with different values
    Changed,
}

/// One entry of a structural diff between local and remote dumps
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffRecord {
    /// Dotted path to the differing field
    pub path: String,

    /// Kind of difference
    pub status: DiffStatus,

    /// Local value, when present
    pub local: Option<Value>,

    /// Remote value, when present
    pub remote: Option<Value>,
}

/// Compute a structural diff between two canonical dumps.
///
/// Objects are walked recursively, arrays element-wise; anything else is
/// compared wholesale.
pub fn diff_values(local: &Value, remote: &Value) -> Vec<DiffRecord> {
    let mut records = Vec::new();
    diff_at("", local, remote, &mut records);
    records
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn diff_at(path: &str, local: &Value, remote: &Value, records: &mut Vec<DiffRecord>) {
    match (local, remote) {
        (Value::Object(l), Value::Object(r)) => {
            for (key, local_value) in l {
                match r.get(key) {
                    Some(remote_value) => {
                        diff_at(&join_path(path, key), local_value, remote_value, records)
                    }
                    None => records.push(DiffRecord {
                        path: join_path(path, key),
                        status: DiffStatus::Added,
                        local: Some(local_value.clone()),
                        remote: None,
                    }),
                }
            }
            for (key, remote_value) in r {
                if !l.contains_key(key) {
                    records.push(DiffRecord {
                        path: join_path(path, key),
                        status: DiffStatus::Removed,
                        local: None,
                        remote: Some(remote_value.clone()),
                    });
                }
            }
        }
        (Value::Array(l), Value::Array(r)) => {
            for (index, pair) in l.iter().zip(r.iter()).enumerate() {
                diff_at(&join_path(path, &index.to_string()), pair.0, pair.1, records);
            }
            for (index, local_value) in l.iter().enumerate().skip(r.len()) {
                records.push(DiffRecord {
                    path: join_path(path, &index.to_string()),
                    status: DiffStatus::Added,
                    local: Some(local_value.clone()),
                    remote: None,
                });
            }
            for (index, remote_value) in r.iter().enumerate().skip(l.len()) {
                records.push(DiffRecord {
                    path: join_path(path, &index.to_string()),
                    status: DiffStatus::Removed,
                    local: None,
                    remote: Some(remote_value.clone()),
                });
            }
        }
        (l, r) if l != r => records.push(DiffRecord {
            path: path.to_string(),
            status: DiffStatus::Changed,
            local: Some(l.clone()),
            remote: Some(r.clone()),
        }),
        _ => {}
    }
}

/// Conflict resolution for a single entity against its remote counterpart
#[derive(Debug, Clone)]
pub struct ConflictResolution {
    /// The locally validated entity
    local: Entity,

    /// Remote counterpart, once checked and found differing or equal
    remote: Option<Entity>,

    /// Local entity rewritten to the accepted replacement version
    updated: Option<Entity>,

    /// Current state
    state: ConflictState,
}

impl ConflictResolution {
    /// Start tracking a locally validated entity
    pub fn new(local: Entity) -> Self {
        Self {
            local,
            remote: None,
            updated: None,
            state: ConflictState::NotChecked,
        }
    }

    /// Current state
    pub fn state(&self) -> &ConflictState {
        &self.state
    }

    /// The entity to upload: the version-rewritten copy when one was
    /// accepted, otherwise the original.
    pub fn entity(&self) -> &Entity {
        self.updated.as_ref().unwrap_or(&self.local)
    }

    /// The remote counterpart, when one was found
    pub fn remote(&self) -> Option<&Entity> {
        self.remote.as_ref()
    }

    /// Record the result of the remote existence check.
    ///
    /// Equality is full structural equality of the canonicalized dumps,
    /// not just URI equality.
    pub fn check(&mut self, remote: Option<Entity>) -> RegistryResult<&ConflictState> {
        match remote {
            None => {
                self.state = ConflictState::CheckedAbsent;
            }
            Some(remote) => {
                let equal =
                    self.local.to_canonical_value()? == remote.to_canonical_value()?;
                self.remote = Some(remote);
                self.state = if equal {
                    ConflictState::CheckedPresentEqual
                } else {
                    ConflictState::CheckedPresentDiffering
                };
            }
        }
        Ok(&self.state)
    }

    /// Diff the local entity against the differing remote counterpart.
    pub fn diff(&self) -> RegistryResult<Vec<DiffRecord>> {
        let remote = self.remote.as_ref().ok_or_else(|| {
            RegistryError::internal("diff requested before a differing remote was recorded")
        })?;
        Ok(diff_values(
            &self.local.to_canonical_value()?,
            &remote.to_canonical_value()?,
        ))
    }

    /// The default replacement version: the incrementer applied to the
    /// *existing remote* version, not the local one.
    pub fn proposed_version(&self) -> RegistryResult<SemanticVersion> {
        let remote = self.remote.as_ref().ok_or_else(|| {
            RegistryError::internal("no remote entity to derive a version proposal from")
        })?;
        remote.version()?.increment()
    }

    /// Accept a replacement version, rewrite the entity, and revalidate.
    ///
    /// The replacement must differ from the existing remote version and
    /// match the restricted `MAJOR(.MINOR){0,2}` grammar; either violation
    /// aborts this entity's upload.
    pub fn accept_version(
        &mut self,
        replacement: &str,
        grammar: &UriGrammar,
    ) -> RegistryResult<&Entity> {
        if self.state != ConflictState::CheckedPresentDiffering {
            return Err(RegistryError::internal(&format!(
                "cannot accept a version while {}",
                self.state
            )));
        }
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| RegistryError::internal("differing state without a remote entity"))?;

        if !SemanticVersion::matches_plain_bump_grammar(replacement) {
            return Err(RegistryError::VersionConflictUnresolved {
                uri: self.local.uri().to_string(),
                message: format!(
                    "replacement version '{}' does not match MAJOR(.MINOR){{0,2}}",
                    replacement
                ),
            });
        }
        if replacement == remote.version_str() {
            return Err(RegistryError::VersionConflictUnresolved {
                uri: self.local.uri().to_string(),
                message: format!(
                    "replacement version '{}' equals the existing remote version",
                    replacement
                ),
            });
        }

        let version: SemanticVersion = replacement.parse()?;
        self.state = ConflictState::VersionUpdateAccepted;

        // Revalidate the rewritten entity end to end before it may be
        // uploaded: the new URI must still resolve to the same variant.
        let updated = self.local.with_version(&version);
        let revalidated = resolve_entity(&updated.to_canonical_value()?, grammar)?;
        self.updated = Some(revalidated);
        self.state = ConflictState::ReadyToUpload;

        Ok(self.entity())
    }

    /// Decline the version bump; the entity is skipped.
    pub fn decline(&mut self) {
        self.state = ConflictState::VersionUpdateDeclined;
    }
}
