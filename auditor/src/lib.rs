pub mod audit;
pub mod compliance;
pub mod report;

pub use audit::{Auditor, VersionCheck};
pub use compliance::{
    evaluate, extract_common_ci_ref, parse_required_version, AuditError, ComplianceOutcome,
    CI_CONFIG_FILE,
};
pub use report::{compliance_line, file_dump_lines, LogSink, ReportSink};
