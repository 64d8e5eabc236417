//! Batch validation and upload pipeline
//!
//! Drives the CLI `validate` and `upload` commands: collect source files,
//! resolve each document, reject duplicate identities before any remote
//! call, run the per-entity conflict workflow, and accumulate failures so
//! a whole batch can be reported together (unless fail-fast is set).

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::client::RemoteClient;
use crate::conflict::{ConflictResolution, ConflictState, DiffRecord};
use crate::entity::{resolve_entity, Entity};
use crate::error::{RegistryError, RegistryResult};
use crate::uri::UriGrammar;

/// Batch processing options
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Abort the whole batch on the first failure
    pub fail_fast: bool,

    /// Skip the remote existence check entirely
    pub no_external_calls: bool,

    /// Treat a differing remote entity as an error instead of offering a
    /// version bump
    pub strict: bool,
}

/// One successfully processed entity
#[derive(Debug, Clone)]
pub struct BatchEntry {
    /// File the entity came from
    pub source: PathBuf,

    /// The validated (possibly version-rewritten) entity
    pub entity: Entity,

    /// Conflict state after the remote check, `NotChecked` when external
    /// calls were skipped
    pub state: ConflictState,
}

/// One failed source file
#[derive(Debug)]
pub struct BatchFailure {
    /// File that failed
    pub source: PathBuf,

    /// Why it failed
    pub error: RegistryError,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Successfully processed entities, sorted by namespace/name/version
    pub entries: Vec<BatchEntry>,

    /// Per-file failures
    pub failures: Vec<BatchFailure>,

    /// Number of entities uploaded
    pub uploaded: usize,

    /// Number of entities skipped (remote equal, or bump declined)
    pub skipped: usize,
}

impl BatchReport {
    /// Whether the batch failed as a whole
    pub fn failed(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Sort entries for display: namespace, then name, then version.
    ///
    /// Filesystem enumeration order is not deterministic across systems,
    /// so display ordering is imposed explicitly here.
    pub fn sort_entries(&mut self) {
        self.entries.sort_by(|a, b| {
            let key = |e: &BatchEntry| {
                (
                    e.entity.namespace().to_string(),
                    e.entity.name().to_string(),
                    e.entity.version().ok(),
                )
            };
            key(a).cmp(&key(b))
        });
    }
}

/// Decision for a differing remote entity
#[derive(Debug, Clone)]
pub enum VersionDecision {
    /// Upload under this replacement version
    Accept(String),

    /// Skip the entity
    Decline,
}

/// Seam for deciding replacement versions: interactive prompt in the CLI,
/// deterministic implementations in tests and under `--auto-confirm`.
pub trait VersionPrompter {
    /// Decide what to do with a local entity whose remote counterpart
    /// differs. `proposed` is the incrementer's default.
    fn resolve_conflict(
        &self,
        entity: &Entity,
        proposed: &str,
        diff: &[DiffRecord],
    ) -> VersionDecision;
}

/// Accept the proposed version without asking
pub struct AutoConfirm;

impl VersionPrompter for AutoConfirm {
    fn resolve_conflict(&self, _: &Entity, proposed: &str, _: &[DiffRecord]) -> VersionDecision {
        VersionDecision::Accept(proposed.to_string())
    }
}

/// Ask on stdin: show the diff, offer the proposed version as default
pub struct StdinPrompt;

impl VersionPrompter for StdinPrompt {
    fn resolve_conflict(
        &self,
        entity: &Entity,
        proposed: &str,
        diff: &[DiffRecord],
    ) -> VersionDecision {
        println!("Entity {} already exists and differs:", entity.uri());
        for record in diff {
            println!(
                "  {} [{:?}] local={} remote={}",
                record.path,
                record.status,
                record
                    .local
                    .as_ref()
                    .map(Value::to_string)
                    .unwrap_or_else(|| "<unset>".to_string()),
                record
                    .remote
                    .as_ref()
                    .map(Value::to_string)
                    .unwrap_or_else(|| "<unset>".to_string()),
            );
        }
        print!("Upload as new version [{}] (empty accepts, 'n' skips): ", proposed);
        let _ = std::io::stdout().flush();

        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            return VersionDecision::Decline;
        }
        let answer = answer.trim();
        match answer {
            "" => VersionDecision::Accept(proposed.to_string()),
            "n" | "N" => VersionDecision::Decline,
            other => VersionDecision::Accept(other.to_string()),
        }
    }
}

/// Supported source file extensions
const SOURCE_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Expand source paths into entity files.
///
/// Directories are listed one level deep; only `.json`, `.yaml` and `.yml`
/// files are taken.
pub fn collect_sources(paths: &[PathBuf]) -> RegistryResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for item in std::fs::read_dir(path)? {
                let item = item?.path();
                let extension = item
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or_default();
                if item.is_file() && SOURCE_EXTENSIONS.contains(&extension) {
                    files.push(item);
                }
            }
        } else {
            return Err(RegistryError::invalid_request(&format!(
                "source '{}' does not exist",
                path.display()
            )));
        }
    }

    Ok(files)
}

/// Read one source file into a raw document. YAML is a superset of JSON,
/// so both formats go through the YAML parser.
pub fn load_document(path: &Path) -> RegistryResult<Value> {
    let content = std::fs::read_to_string(path)?;
    let document: Value = serde_yaml::from_str(&content).map_err(|e| {
        RegistryError::deserialization(&format!("{}: {}", path.display(), e))
    })?;
    Ok(document)
}

fn record_failure(
    report: &mut BatchReport,
    source: &Path,
    error: RegistryError,
    fail_fast: bool,
) -> RegistryResult<()> {
    warn!(source = %source.display(), %error, "Entity failed");
    if fail_fast {
        return Err(error);
    }
    report.failures.push(BatchFailure {
        source: source.to_path_buf(),
        error,
    });
    Ok(())
}

/// Resolve all source files and reject duplicate identities.
///
/// The set-of-seen-URIs dedupe completes synchronously here, before the
/// caller makes any remote call: each unique URI is checked against the
/// remote store at most once, and a duplicate never reaches the check
/// phase. The first-encountered file keeps its entity; the duplicate is
/// reported as a failure naming both files.
fn resolve_sources(
    files: &[PathBuf],
    grammar: &UriGrammar,
    options: &BatchOptions,
    report: &mut BatchReport,
) -> RegistryResult<Vec<(PathBuf, Entity)>> {
    let mut resolved: Vec<(PathBuf, Entity)> = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for file in files {
        let outcome = load_document(file).and_then(|doc| resolve_entity(&doc, grammar));
        let entity = match outcome {
            Ok(entity) => entity,
            Err(error) => {
                record_failure(report, file, error, options.fail_fast)?;
                continue;
            }
        };

        if let Some(first) = seen.get(entity.uri()) {
            let error = RegistryError::DuplicateIdentity {
                uri: entity.uri().to_string(),
                first: first.display().to_string(),
                second: file.display().to_string(),
            };
            record_failure(report, file, error, options.fail_fast)?;
            continue;
        }

        seen.insert(entity.uri().to_string(), file.clone());
        resolved.push((file.clone(), entity));
    }

    Ok(resolved)
}

async fn fetch_remote(
    client: &RemoteClient,
    uri: &str,
    grammar: &UriGrammar,
) -> RegistryResult<Option<Entity>> {
    match client.fetch_entity(uri).await? {
        None => Ok(None),
        Some(document) => Ok(Some(resolve_entity(&document, grammar)?)),
    }
}

/// Validate a batch of source files.
///
/// With external calls enabled, each unique entity is additionally checked
/// against the remote store and its conflict state recorded. Under
/// `--strict` a differing remote counterpart is a failure.
pub async fn validate_batch(
    paths: &[PathBuf],
    grammar: &UriGrammar,
    client: &RemoteClient,
    options: &BatchOptions,
) -> RegistryResult<BatchReport> {
    let files = collect_sources(paths)?;
    let mut report = BatchReport::default();

    let resolved = resolve_sources(&files, grammar, options, &mut report)?;

    for (source, entity) in resolved {
        let state = if options.no_external_calls {
            ConflictState::NotChecked
        } else {
            let remote = match fetch_remote(client, entity.uri(), grammar).await {
                Ok(remote) => remote,
                Err(error) => {
                    record_failure(&mut report, &source, error, options.fail_fast)?;
                    continue;
                }
            };
            let mut resolution = ConflictResolution::new(entity.clone());
            resolution.check(remote)?.clone()
        };

        if options.strict && state == ConflictState::CheckedPresentDiffering {
            let error = RegistryError::VersionConflictUnresolved {
                uri: entity.uri().to_string(),
                message: "remote entity differs (strict mode)".to_string(),
            };
            record_failure(&mut report, &source, error, options.fail_fast)?;
            continue;
        }

        report.entries.push(BatchEntry {
            source,
            entity,
            state,
        });
    }

    report.sort_entries();
    info!(
        validated = report.entries.len(),
        failed = report.failures.len(),
        "Validation finished"
    );
    Ok(report)
}

/// Upload a batch of source files.
///
/// Every entity is validated and checked against the remote store; absent
/// entities are uploaded as-is, structurally equal ones are skipped, and
/// differing ones go through the version-bump workflow driven by the
/// prompter.
pub async fn upload_batch(
    paths: &[PathBuf],
    grammar: &UriGrammar,
    client: &RemoteClient,
    create_endpoint: &str,
    options: &BatchOptions,
    prompter: &dyn VersionPrompter,
) -> RegistryResult<BatchReport> {
    let files = collect_sources(paths)?;
    let mut report = BatchReport::default();

    let resolved = resolve_sources(&files, grammar, options, &mut report)?;

    let mut to_upload: Vec<Value> = Vec::new();
    for (source, entity) in resolved {
        let remote = match fetch_remote(client, entity.uri(), grammar).await {
            Ok(remote) => remote,
            Err(error) => {
                record_failure(&mut report, &source, error, options.fail_fast)?;
                continue;
            }
        };

        let mut resolution = ConflictResolution::new(entity.clone());
        let state = resolution.check(remote)?.clone();

        match state {
            ConflictState::CheckedAbsent => {
                to_upload.push(entity.to_canonical_value()?);
                report.entries.push(BatchEntry {
                    source,
                    entity,
                    state,
                });
            }
            ConflictState::CheckedPresentEqual => {
                info!(uri = entity.uri(), "Already uploaded, skipping");
                report.skipped += 1;
                report.entries.push(BatchEntry {
                    source,
                    entity,
                    state,
                });
            }
            ConflictState::CheckedPresentDiffering => {
                if options.strict {
                    let error = RegistryError::VersionConflictUnresolved {
                        uri: entity.uri().to_string(),
                        message: "remote entity differs (strict mode)".to_string(),
                    };
                    record_failure(&mut report, &source, error, options.fail_fast)?;
                    continue;
                }

                let outcome = resolve_version_conflict(
                    &mut resolution,
                    grammar,
                    prompter,
                );
                match outcome {
                    Ok(Some(updated)) => {
                        to_upload.push(updated.to_canonical_value()?);
                        report.entries.push(BatchEntry {
                            source,
                            entity: updated,
                            state: ConflictState::ReadyToUpload,
                        });
                    }
                    Ok(None) => {
                        report.skipped += 1;
                        report.entries.push(BatchEntry {
                            source,
                            entity,
                            state: ConflictState::VersionUpdateDeclined,
                        });
                    }
                    Err(error) => {
                        record_failure(&mut report, &source, error, options.fail_fast)?;
                    }
                }
            }
            other => {
                return Err(RegistryError::internal(&format!(
                    "unexpected conflict state after check: {}",
                    other
                )));
            }
        }
    }

    // Entities that passed validation and the conflict workflow are
    // uploaded even when other files in the batch failed.
    if !to_upload.is_empty() {
        client.create_entities(create_endpoint, &to_upload).await?;
        report.uploaded = to_upload.len();
    }

    report.sort_entries();
    info!(
        uploaded = report.uploaded,
        skipped = report.skipped,
        failed = report.failures.len(),
        "Upload finished"
    );
    Ok(report)
}

fn resolve_version_conflict(
    resolution: &mut ConflictResolution,
    grammar: &UriGrammar,
    prompter: &dyn VersionPrompter,
) -> RegistryResult<Option<Entity>> {
    let proposed = resolution.proposed_version()?.to_string();
    let diff = resolution.diff()?;

    match prompter.resolve_conflict(resolution.entity(), &proposed, &diff) {
        VersionDecision::Accept(version) => {
            let updated = resolution.accept_version(&version, grammar)?.clone();
            Ok(Some(updated))
        }
        VersionDecision::Decline => {
            resolution.decline();
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "http://onto-ns.com/meta";

    fn grammar() -> UriGrammar {
        UriGrammar::new(BASE).unwrap()
    }

    fn write_person(dir: &Path, file: &str, version: &str) -> PathBuf {
        let path = dir.join(file);
        let document = json!({
            "namespace": BASE,
            "version": version,
            "name": "Person",
            "properties": {"age": {"type": "int", "description": "age"}},
        });
        std::fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).unwrap();
        path
    }

    fn options_offline() -> BatchOptions {
        BatchOptions {
            no_external_calls: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_collect_sources_filters_extensions() {
        let dir = std::env::temp_dir().join("entity-registry-test-collect");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        write_person(&dir, "a.json", "0.1");
        std::fs::write(dir.join("b.yaml"), "uri: x").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let mut files = collect_sources(&[dir.clone()]).unwrap();
        files.sort();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.json", "b.yaml"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_collect_sources_rejects_missing_path() {
        let result = collect_sources(&[PathBuf::from("/definitely/not/here")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_document_accepts_yaml_and_json() {
        let dir = std::env::temp_dir().join("entity-registry-test-load");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let json_path = write_person(&dir, "a.json", "0.1");
        assert!(load_document(&json_path).is_ok());

        let yaml_path = dir.join("a.yaml");
        std::fs::write(
            &yaml_path,
            "namespace: http://onto-ns.com/meta\nversion: '0.1'\nname: Person\nproperties:\n  age:\n    type: int\n    description: age\n",
        )
        .unwrap();
        let document = load_document(&yaml_path).unwrap();
        assert_eq!(document["name"], json!("Person"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_validate_batch_offline() {
        let dir = std::env::temp_dir().join("entity-registry-test-validate");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        write_person(&dir, "person.json", "0.1");

        let report = validate_batch(
            &[dir.clone()],
            &grammar(),
            &RemoteClient::new(),
            &options_offline(),
        )
        .await
        .unwrap();

        assert!(!report.failed());
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].state, ConflictState::NotChecked);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_identity_reports_second_file_keeps_first() {
        let dir = std::env::temp_dir().join("entity-registry-test-dupes");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let first = write_person(&dir, "a.json", "0.1");
        let second = write_person(&dir, "b.json", "0.1");

        let report = validate_batch(
            &[first.clone(), second.clone()],
            &grammar(),
            &RemoteClient::new(),
            &options_offline(),
        )
        .await
        .unwrap();

        assert!(report.failed());
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].source, first);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].source, second);
        assert!(matches!(
            report.failures[0].error,
            RegistryError::DuplicateIdentity { .. }
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_on_first_error() {
        let dir = std::env::temp_dir().join("entity-registry-test-failfast");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let path = dir.join("broken.json");
        std::fs::write(&path, "{\"name\": \"Person\"}").unwrap();

        let options = BatchOptions {
            fail_fast: true,
            no_external_calls: true,
            ..Default::default()
        };
        let result =
            validate_batch(&[path], &grammar(), &RemoteClient::new(), &options).await;
        assert!(result.is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_report_sorted_by_namespace_name_version() {
        let dir = std::env::temp_dir().join("entity-registry-test-sort");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        write_person(&dir, "z.json", "0.2");
        write_person(&dir, "a.json", "0.10");

        let report = validate_batch(
            &[dir.clone()],
            &grammar(),
            &RemoteClient::new(),
            &options_offline(),
        )
        .await
        .unwrap();

        let versions: Vec<&str> = report
            .entries
            .iter()
            .map(|e| e.entity.version_str())
            .collect();
        assert_eq!(versions, ["0.2", "0.10"]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
