use gitlab::types::Project;
use tracing::info;

use crate::compliance::ComplianceOutcome;

/// Sink for human-readable result lines, passed explicitly so the audit
/// paths stay testable without capturing log output.
pub trait ReportSink {
    fn emit(&mut self, line: &str);
}

/// Emits result lines through the tracing subscriber.
#[derive(Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn emit(&mut self, line: &str) {
        info!("{}", line);
    }
}

pub fn compliance_line(project: &Project, outcome: &ComplianceOutcome) -> String {
    match outcome {
        ComplianceOutcome::Matched { found, required } => format!(
            "[{}](#{}) matched common-ci {} >= {}",
            project.web_url, project.id, found, required
        ),
        ComplianceOutcome::HasVersion { found } => format!(
            "[{}](#{}) has common-ci version {}",
            project.web_url, project.id, found
        ),
        ComplianceOutcome::NoReference => format!(
            "[{}](#{}) has no common-ci reference",
            project.web_url, project.id
        ),
    }
}

pub fn file_dump_lines(project: &Project, filename: &str, content: &str) -> Vec<String> {
    vec![
        format!("[{}] {} --- START", project.path_with_namespace, filename),
        content.to_string(),
        format!("[{}] {} --- END", project.path_with_namespace, filename),
    ]
}
