use auditor::{Auditor, LogSink, VersionCheck};
use clap::Parser;
use gitlab::{GitlabClient, GitlabConfig};
use tracing::info;

#[derive(Parser)]
#[command(name = "auditor")]
#[command(about = "Audits GitLab projects for common-ci template compliance")]
struct Cli {
    /// Path to the TOML configuration file holding the GitLab URL and token
    #[arg(long, default_value = "~/.gitlab-auditor.toml")]
    gitlab_config_file: String,

    /// GitLab group ID to audit, recursively including subgroups
    #[arg(long, default_value_t = -1)]
    group_id: i64,

    /// GitLab project ID to audit
    #[arg(long, default_value_t = -1)]
    project_id: i64,

    /// Minimum required common-ci version; pass an empty string to report
    /// discovered versions instead of checking them
    #[arg(long)]
    common_ci_version: Option<String>,

    /// File name whose content is printed for each audited project
    #[arg(long)]
    file_content: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // The only per-run fatal input: a malformed required version.
    let check = VersionCheck::from_flag(cli.common_ci_version.as_deref())?;

    let config = GitlabConfig::load(&cli.gitlab_config_file)?;
    let client = GitlabClient::new(config)?;

    let user = client.authenticate().await?;
    info!(
        "User {} with email {} connected to {}",
        user.username,
        user.email.as_deref().unwrap_or("unknown"),
        client.base_url()
    );

    let auditor = Auditor::new(client);
    let mut sink = LogSink;

    if cli.group_id > -1 {
        auditor
            .check_group(
                cli.group_id as u64,
                &check,
                cli.file_content.as_deref(),
                &mut sink,
            )
            .await;
    } else if cli.project_id > -1 {
        let project_id = cli.project_id as u64;
        if check.is_enabled() {
            auditor
                .check_project(project_id, check.required(), &mut sink)
                .await;
        }
        if let Some(filename) = cli.file_content.as_deref() {
            auditor.dump_file(project_id, filename, &mut sink).await;
        }
    } else {
        info!("Nothing done");
    }

    Ok(())
}
