use gitlab::api::BlobStore;
use gitlab::types::TreeEntry;
use pep440_rs::Version;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;
use yaml_rust2::{Yaml, YamlLoader};

/// The CI configuration file checked at the root of every project.
pub const CI_CONFIG_FILE: &str = ".gitlab-ci.yml";

/// Branch-tracking references are always considered compliant.
const DEFAULT_BRANCHES: [&str; 2] = ["master", "main"];

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Invalid required version {value:?}: {message}")]
    InvalidRequiredVersion { value: String, message: String },

    #[error("Invalid common-ci reference {value:?}: {message}")]
    InvalidReference { value: String, message: String },
}

/// A reportable audit result. The two silent decision-table rows (reference
/// below the requirement, and no reference while a requirement was given)
/// produce no outcome at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplianceOutcome {
    Matched { found: String, required: String },
    HasVersion { found: String },
    NoReference,
}

/// Validates the `--common-ci-version` argument. A malformed value here is
/// the only input that aborts a whole run.
pub fn parse_required_version(value: &str) -> Result<Version, AuditError> {
    Version::from_str(value).map_err(|e| AuditError::InvalidRequiredVersion {
        value: value.to_string(),
        message: e.to_string(),
    })
}

/// Lists the root tree of the project's default branch, trying `master` then
/// `main`. If both lookups fail the project is skipped: the errors go to the
/// debug log and no result is produced.
pub async fn resolve_root_entries<S: BlobStore>(
    store: &S,
    project_id: u64,
) -> Option<Vec<TreeEntry>> {
    match store.list_root_entries(project_id, "master").await {
        Ok(entries) => Some(entries),
        Err(master_err) => match store.list_root_entries(project_id, "main").await {
            Ok(entries) => Some(entries),
            Err(main_err) => {
                debug!("[P:{}] {}", project_id, main_err);
                debug!("[P:{}] {}", project_id, master_err);
                None
            }
        },
    }
}

/// Scans entries in the order the store returned them.
pub fn find_entry<'a>(entries: &'a [TreeEntry], name: &str) -> Option<&'a TreeEntry> {
    entries.iter().find(|entry| entry.name == name)
}

/// Fetches and decodes a blob. Fetch errors and non-base64 encodings degrade
/// to `None` so a batch run keeps going.
pub async fn fetch_file_bytes<S: BlobStore>(
    store: &S,
    project_id: u64,
    entry: &TreeEntry,
) -> Option<Vec<u8>> {
    match store.fetch_blob(project_id, &entry.id).await {
        Ok(blob) => blob.decode(),
        Err(err) => {
            debug!("[P:{}] {}", project_id, err);
            None
        }
    }
}

/// Resolves the common-ci reference declared in a CI configuration.
///
/// The `include` sequence is folded left: every mapping entry carrying a
/// `project` key overwrites the running reference with that entry's `ref`
/// scalar, so the last matching entry wins. An unparsable document, a
/// non-mapping document, a missing `include` key, or a non-sequence `include`
/// all resolve to the empty reference.
///
/// Scalars are taken as written: `yaml-rust2` keeps the source text of
/// float-shaped values, so a `ref: 1.20` stays `"1.20"` instead of collapsing
/// to a number.
pub fn extract_common_ci_ref(bytes: &[u8]) -> String {
    let Ok(text) = std::str::from_utf8(bytes) else {
        return String::new();
    };
    let Ok(docs) = YamlLoader::load_from_str(text) else {
        return String::new();
    };
    let Some(doc) = docs.first() else {
        return String::new();
    };
    let Yaml::Array(includes) = &doc["include"] else {
        return String::new();
    };

    let project_key = Yaml::String("project".to_string());
    let ref_key = Yaml::String("ref".to_string());

    let mut common_ref = String::new();
    for entry in includes {
        let Yaml::Hash(mapping) = entry else {
            continue;
        };
        if mapping.contains_key(&project_key) {
            common_ref = mapping
                .get(&ref_key)
                .and_then(scalar_text)
                .unwrap_or_default();
        }
    }

    common_ref
}

fn scalar_text(value: &Yaml) -> Option<String> {
    match value {
        Yaml::String(text) => Some(text.clone()),
        Yaml::Real(raw) => Some(raw.clone()),
        Yaml::Integer(number) => Some(number.to_string()),
        Yaml::Boolean(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Runs the full compliance check for one project.
///
/// Returns `Ok(None)` for every silent case: unreachable default branch,
/// reference below the requirement, or no reference while a requirement was
/// given. A discovered reference that is neither a default branch nor a
/// parsable version is a reported error, but the caller is expected to keep
/// the batch going.
pub async fn evaluate<S: BlobStore>(
    store: &S,
    project_id: u64,
    required: Option<&Version>,
) -> Result<Option<ComplianceOutcome>, AuditError> {
    let Some(entries) = resolve_root_entries(store, project_id).await else {
        return Ok(None);
    };

    let mut common_ref = String::new();
    if let Some(entry) = find_entry(&entries, CI_CONFIG_FILE) {
        if let Some(bytes) = fetch_file_bytes(store, project_id, entry).await {
            common_ref = extract_common_ci_ref(&bytes);
        }
    }

    match (common_ref.is_empty(), required) {
        (false, Some(required)) => {
            if DEFAULT_BRANCHES.contains(&common_ref.as_str()) {
                return Ok(Some(ComplianceOutcome::Matched {
                    found: common_ref,
                    required: required.to_string(),
                }));
            }

            let found =
                Version::from_str(&common_ref).map_err(|e| AuditError::InvalidReference {
                    value: common_ref.clone(),
                    message: e.to_string(),
                })?;

            if found >= *required {
                Ok(Some(ComplianceOutcome::Matched {
                    found: common_ref,
                    required: required.to_string(),
                }))
            } else {
                Ok(None)
            }
        }
        (false, None) => Ok(Some(ComplianceOutcome::HasVersion { found: common_ref })),
        (true, None) => Ok(Some(ComplianceOutcome::NoReference)),
        (true, Some(_)) => Ok(None),
    }
}
