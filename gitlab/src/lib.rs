pub mod api;
pub mod client;
pub mod config;
pub mod types;

pub use api::{BlobStore, GitlabError, GitlabResult, ProjectDirectory};
pub use client::GitlabClient;
pub use config::GitlabConfig;
pub use types::{CurrentUser, Project, RepositoryBlob, TreeEntry};

pub mod prelude {
    pub use crate::api::*;
    pub use crate::client::*;
    pub use crate::config::*;
    pub use crate::types::*;
}
