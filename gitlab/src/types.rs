use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde::{Deserialize, Serialize};

/// A project handle as returned by the projects and group-projects endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub web_url: String,
    pub path_with_namespace: String,
}

/// One file or directory record at the repository root for a given ref.
///
/// Fetched fresh per check and discarded after use; entry order is whatever
/// the API returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub id: String,
    pub name: String,
}

/// A raw blob payload in its transport encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryBlob {
    pub encoding: String,
    pub content: String,
}

impl RepositoryBlob {
    /// Decodes the payload. Only base64 transport encoding is supported; any
    /// other encoding or a corrupt payload yields `None`.
    pub fn decode(&self) -> Option<Vec<u8>> {
        if self.encoding != "base64" {
            return None;
        }

        // GitLab wraps long blob payloads in newlines.
        let compact: String = self
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        BASE64_STANDARD.decode(compact.as_bytes()).ok()
    }
}

/// The authenticated user, fetched once at startup for the connection banner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub username: String,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_deserialization_ignores_extra_fields() {
        let json = r#"{
            "id": 42,
            "web_url": "https://gitlab.example.com/team/app",
            "path_with_namespace": "team/app",
            "default_branch": "main",
            "archived": false
        }"#;

        let project: Project = serde_json::from_str(json).unwrap();
        assert_eq!(project.id, 42);
        assert_eq!(project.web_url, "https://gitlab.example.com/team/app");
        assert_eq!(project.path_with_namespace, "team/app");
    }

    #[test]
    fn test_tree_entry_deserialization() {
        let json = r#"[
            {"id": "a1b2c3", "name": ".gitlab-ci.yml", "type": "blob", "path": ".gitlab-ci.yml", "mode": "100644"},
            {"id": "d4e5f6", "name": "src", "type": "tree", "path": "src", "mode": "040000"}
        ]"#;

        let entries: Vec<TreeEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, ".gitlab-ci.yml");
        assert_eq!(entries[0].id, "a1b2c3");
    }

    #[test]
    fn test_blob_decode_base64() {
        let blob = RepositoryBlob {
            encoding: "base64".to_string(),
            content: BASE64_STANDARD.encode("include:\n"),
        };

        assert_eq!(blob.decode(), Some(b"include:\n".to_vec()));
    }

    #[test]
    fn test_blob_decode_wrapped_payload() {
        let encoded = BASE64_STANDARD.encode("a longer payload that gets wrapped");
        let wrapped = format!("{}\n{}\n", &encoded[..8], &encoded[8..]);
        let blob = RepositoryBlob {
            encoding: "base64".to_string(),
            content: wrapped,
        };

        assert_eq!(
            blob.decode(),
            Some(b"a longer payload that gets wrapped".to_vec())
        );
    }

    #[test]
    fn test_blob_decode_rejects_other_encodings() {
        let blob = RepositoryBlob {
            encoding: "text".to_string(),
            content: "include:\n".to_string(),
        };

        assert_eq!(blob.decode(), None);
    }

    #[test]
    fn test_blob_decode_rejects_corrupt_payload() {
        let blob = RepositoryBlob {
            encoding: "base64".to_string(),
            content: "!!! not base64 !!!".to_string(),
        };

        assert_eq!(blob.decode(), None);
    }

    #[test]
    fn test_current_user_without_email() {
        let json = r#"{"username": "auditor-bot", "id": 7}"#;
        let user: CurrentUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.username, "auditor-bot");
        assert_eq!(user.email, None);
    }
}
