use crate::api::{BlobStore, GitlabError, GitlabResult, ProjectDirectory};
use crate::config::GitlabConfig;
use crate::types::{CurrentUser, Project, RepositoryBlob, TreeEntry};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use tracing::debug;

const PER_PAGE: u32 = 100;

/// GitLab REST v4 client.
///
/// Every request carries the configured `PRIVATE-TOKEN` header; list
/// endpoints follow `x-next-page` pagination until exhausted.
pub struct GitlabClient {
    client: reqwest::Client,
    config: GitlabConfig,
}

impl GitlabClient {
    pub fn new(config: GitlabConfig) -> GitlabResult<Self> {
        config
            .validate()
            .map_err(|msg| GitlabError::InvalidConfig { message: msg })?;

        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(&config.private_token).map_err(|_| {
            GitlabError::InvalidConfig {
                message: "Private token contains invalid header characters".to_string(),
            }
        })?;
        token.set_sensitive(true);
        headers.insert("PRIVATE-TOKEN", token);

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| GitlabError::Unknown {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Verifies the token by fetching the authenticated user.
    pub async fn authenticate(&self) -> GitlabResult<CurrentUser> {
        let url = self.api_url("user");
        debug!("Authenticating against {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::handle_http_error)?;
        let response = Self::check_status(response, "user").await?;

        response.json().await.map_err(Self::handle_http_error)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v4/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn handle_http_error(err: reqwest::Error) -> GitlabError {
        if err.is_timeout() {
            GitlabError::ServiceUnavailable {
                message: "Request timeout".to_string(),
            }
        } else if err.is_connect() {
            GitlabError::ServiceUnavailable {
                message: "Cannot connect to GitLab".to_string(),
            }
        } else {
            GitlabError::Network(err)
        }
    }

    async fn check_status(response: Response, resource: &str) -> GitlabResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GitlabError::Authentication),
            StatusCode::NOT_FOUND => Err(GitlabError::NotFound {
                resource: resource.to_string(),
            }),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(GitlabError::Unknown {
                    message: format!("GitLab API returned {} for {}: {}", status, resource, body),
                })
            }
        }
    }

    /// Fetches every page of a list endpoint, preserving server order.
    async fn get_paginated<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        resource: &str,
    ) -> GitlabResult<Vec<T>> {
        let mut collected = Vec::new();
        let mut page = Some(1u32);

        while let Some(current) = page {
            debug!("Fetching {} page {}", resource, current);

            let response = self
                .client
                .get(url)
                .query(query)
                .query(&[
                    ("per_page", PER_PAGE.to_string()),
                    ("page", current.to_string()),
                ])
                .send()
                .await
                .map_err(Self::handle_http_error)?;
            let response = Self::check_status(response, resource).await?;

            page = next_page(response.headers());

            let mut items: Vec<T> = response.json().await.map_err(Self::handle_http_error)?;
            collected.append(&mut items);
        }

        Ok(collected)
    }
}

/// Parses the `x-next-page` pagination header; GitLab sends it empty on the
/// last page.
fn next_page(headers: &HeaderMap) -> Option<u32> {
    headers.get("x-next-page")?.to_str().ok()?.trim().parse().ok()
}

#[async_trait]
impl ProjectDirectory for GitlabClient {
    async fn get_project(&self, project_id: u64) -> GitlabResult<Project> {
        let url = self.api_url(&format!("projects/{}", project_id));
        debug!("Fetching project {}", project_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::handle_http_error)?;
        let response = Self::check_status(response, &format!("project {}", project_id)).await?;

        response.json().await.map_err(Self::handle_http_error)
    }

    async fn list_group_projects(
        &self,
        group_id: u64,
        include_subgroups: bool,
    ) -> GitlabResult<Vec<Project>> {
        let url = self.api_url(&format!("groups/{}/projects", group_id));
        self.get_paginated(
            &url,
            &[("include_subgroups", include_subgroups.to_string())],
            &format!("group {}", group_id),
        )
        .await
    }
}

#[async_trait]
impl BlobStore for GitlabClient {
    async fn list_root_entries(
        &self,
        project_id: u64,
        git_ref: &str,
    ) -> GitlabResult<Vec<TreeEntry>> {
        let url = self.api_url(&format!("projects/{}/repository/tree", project_id));
        self.get_paginated(
            &url,
            &[("ref", git_ref.to_string()), ("path", ".".to_string())],
            &format!("tree of project {} at {}", project_id, git_ref),
        )
        .await
    }

    async fn fetch_blob(&self, project_id: u64, blob_id: &str) -> GitlabResult<RepositoryBlob> {
        let url = self.api_url(&format!(
            "projects/{}/repository/blobs/{}",
            project_id, blob_id
        ));
        debug!("Fetching blob {} of project {}", blob_id, project_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::handle_http_error)?;
        let response = Self::check_status(response, &format!("blob {}", blob_id)).await?;

        response.json().await.map_err(Self::handle_http_error)
    }
}
