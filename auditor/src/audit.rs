use gitlab::api::{BlobStore, ProjectDirectory};
use pep440_rs::Version;
use tracing::{debug, error};

use crate::compliance::{self, AuditError};
use crate::report::{compliance_line, file_dump_lines, ReportSink};

/// Interpretation of the `--common-ci-version` flag.
#[derive(Debug, Clone)]
pub enum VersionCheck {
    /// Flag absent: no compliance check runs.
    Disabled,
    /// Flag present but empty: report discovered versions and absences.
    Informational,
    /// Flag carries a version: report references at or above it.
    AtLeast(Version),
}

impl VersionCheck {
    pub fn from_flag(flag: Option<&str>) -> Result<Self, AuditError> {
        match flag {
            None => Ok(Self::Disabled),
            Some("") => Ok(Self::Informational),
            Some(value) => Ok(Self::AtLeast(compliance::parse_required_version(value)?)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    pub fn required(&self) -> Option<&Version> {
        match self {
            Self::AtLeast(version) => Some(version),
            _ => None,
        }
    }
}

/// Drives compliance checks and file dumps over a project directory,
/// strictly one project at a time. No error from a single project aborts a
/// batch.
pub struct Auditor<C> {
    client: C,
}

impl<C: ProjectDirectory + BlobStore> Auditor<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub async fn check_project(
        &self,
        project_id: u64,
        required: Option<&Version>,
        sink: &mut dyn ReportSink,
    ) {
        let project = match self.client.get_project(project_id).await {
            Ok(project) => project,
            Err(err) => {
                debug!("[P:{}] {}", project_id, err);
                return;
            }
        };

        match compliance::evaluate(&self.client, project.id, required).await {
            Ok(Some(outcome)) => sink.emit(&compliance_line(&project, &outcome)),
            Ok(None) => {}
            Err(err) => error!("[P:{}] {}", project.id, err),
        }
    }

    pub async fn dump_file(&self, project_id: u64, filename: &str, sink: &mut dyn ReportSink) {
        let project = match self.client.get_project(project_id).await {
            Ok(project) => project,
            Err(err) => {
                debug!("[P:{}] {}", project_id, err);
                return;
            }
        };

        let Some(entries) = compliance::resolve_root_entries(&self.client, project.id).await
        else {
            return;
        };
        let Some(entry) = compliance::find_entry(&entries, filename) else {
            return;
        };
        let Some(bytes) = compliance::fetch_file_bytes(&self.client, project.id, entry).await
        else {
            return;
        };

        let content = String::from_utf8_lossy(&bytes);
        for line in file_dump_lines(&project, filename, &content) {
            sink.emit(&line);
        }
    }

    pub async fn check_group(
        &self,
        group_id: u64,
        check: &VersionCheck,
        dump: Option<&str>,
        sink: &mut dyn ReportSink,
    ) {
        let projects = match self.client.list_group_projects(group_id, true).await {
            Ok(projects) => projects,
            Err(err) => {
                debug!("[G:{}] {}", group_id, err);
                Vec::new()
            }
        };

        for project in projects {
            if check.is_enabled() {
                self.check_project(project.id, check.required(), sink).await;
            }
            if let Some(filename) = dump {
                self.dump_file(project.id, filename, sink).await;
            }
        }
    }
}
