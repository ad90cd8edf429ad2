use crate::types::{Project, RepositoryBlob, TreeEntry};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitlabError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("Authentication failed")]
    Authentication,

    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

pub type GitlabResult<T> = Result<T, GitlabError>;

/// Lists and resolves projects, individually or across a group hierarchy.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn get_project(&self, project_id: u64) -> GitlabResult<Project>;

    async fn list_group_projects(
        &self,
        group_id: u64,
        include_subgroups: bool,
    ) -> GitlabResult<Vec<Project>>;
}

/// Fetches file-tree entries and raw blob payloads for a project.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn list_root_entries(
        &self,
        project_id: u64,
        git_ref: &str,
    ) -> GitlabResult<Vec<TreeEntry>>;

    async fn fetch_blob(&self, project_id: u64, blob_id: &str) -> GitlabResult<RepositoryBlob>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockGitlab;

    #[async_trait]
    impl ProjectDirectory for MockGitlab {
        async fn get_project(&self, project_id: u64) -> GitlabResult<Project> {
            Ok(Project {
                id: project_id,
                web_url: format!("https://gitlab.example.com/mock/{}", project_id),
                path_with_namespace: format!("mock/{}", project_id),
            })
        }

        async fn list_group_projects(
            &self,
            _group_id: u64,
            _include_subgroups: bool,
        ) -> GitlabResult<Vec<Project>> {
            Ok(vec![self.get_project(1).await?, self.get_project(2).await?])
        }
    }

    #[async_trait]
    impl BlobStore for MockGitlab {
        async fn list_root_entries(
            &self,
            _project_id: u64,
            git_ref: &str,
        ) -> GitlabResult<Vec<TreeEntry>> {
            if git_ref != "main" {
                return Err(GitlabError::NotFound {
                    resource: format!("ref {}", git_ref),
                });
            }
            Ok(vec![TreeEntry {
                id: "abc".to_string(),
                name: ".gitlab-ci.yml".to_string(),
            }])
        }

        async fn fetch_blob(
            &self,
            _project_id: u64,
            blob_id: &str,
        ) -> GitlabResult<RepositoryBlob> {
            Ok(RepositoryBlob {
                encoding: "base64".to_string(),
                content: blob_id.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_mock_directory() {
        let gitlab = MockGitlab;

        let project = gitlab.get_project(7).await.unwrap();
        assert_eq!(project.id, 7);
        assert_eq!(project.path_with_namespace, "mock/7");

        let projects = gitlab.list_group_projects(1, true).await.unwrap();
        assert_eq!(projects.len(), 2);
    }

    #[tokio::test]
    async fn test_mock_blob_store() {
        let gitlab = MockGitlab;

        let entries = gitlab.list_root_entries(7, "main").await.unwrap();
        assert_eq!(entries[0].name, ".gitlab-ci.yml");

        let missing = gitlab.list_root_entries(7, "master").await;
        assert!(matches!(missing, Err(GitlabError::NotFound { .. })));

        let blob = gitlab.fetch_blob(7, "abc").await.unwrap();
        assert_eq!(blob.encoding, "base64");
    }
}
