use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::api::{GitlabError, GitlabResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitlabConfig {
    pub base_url: String,
    pub private_token: String,
    pub timeout: Duration,
}

impl Default for GitlabConfig {
    fn default() -> Self {
        Self {
            base_url: "https://gitlab.com".to_string(),
            private_token: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// On-disk layout of the configuration file.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    url: String,
    private_token: String,
    timeout_secs: Option<u64>,
}

impl GitlabConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_private_token(mut self, private_token: impl Into<String>) -> Self {
        self.private_token = private_token.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Loads a TOML configuration file, expanding a leading `~/` against the
    /// home directory.
    pub fn load(path: &str) -> GitlabResult<Self> {
        let path = expand_home(path);
        let raw = std::fs::read_to_string(&path).map_err(|e| GitlabError::InvalidConfig {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;

        let file: ConfigFile = toml::from_str(&raw).map_err(|e| GitlabError::InvalidConfig {
            message: format!("cannot parse {}: {}", path.display(), e),
        })?;

        let mut config = Self::default()
            .with_base_url(file.url)
            .with_private_token(file.private_token);
        if let Some(secs) = file.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("Base URL cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("Base URL must start with http:// or https://".to_string());
        }

        if self.private_token.is_empty() {
            return Err("Private token cannot be empty".to_string());
        }

        if self.timeout.is_zero() {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
