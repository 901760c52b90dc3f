use crate::config::Config;
use crate::profile::{ConfigSynchronizer, SyncReport};
use crate::sso::{AccountEnumerator, AcquireConfig, HttpSsoClient, TokenAcquirer, TokenCache};
use anyhow::{Context, Result};
use colored::Colorize;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct GenerateOptions {
    /// Show a diff of the AWS config file before committing it
    pub diff: bool,
    /// Settings file, `None` for `~/.awsssoconfig`
    pub config_path: Option<PathBuf>,
}

/// Regenerate the AWS config profiles for every accessible account
///
/// # Arguments
/// * `options` - Command line options
///
/// # Returns
/// * `Ok(())` - The AWS config file was updated
/// * `Err(anyhow::Error)` - Invalid settings, login failure, listing failure
///   or the config file could not be rewritten
pub async fn generate_command(options: GenerateOptions) -> Result<()> {
    info!("Executing generate command");

    let mut config = Config::load(options.config_path.as_deref())?;
    config.apply_env_overrides(std::env::vars());
    config.validate().context("Configuration error")?;

    let backend = Arc::new(HttpSsoClient::new(&config.sso.region)?);
    let cache = TokenCache::default_dir().map(TokenCache::new);
    let mut acquirer = TokenAcquirer::new(
        backend.clone(),
        cache,
        AcquireConfig::new(config.sso.start_url.clone()),
    );
    let enumerator = AccountEnumerator::new(backend);
    let synchronizer = ConfigSynchronizer::new();

    let report = run_generate(
        &config,
        &mut acquirer,
        &enumerator,
        &synchronizer,
        options.diff,
    )
    .await?;

    for line in summary(&report, &config.aws.config_file) {
        println!("{}", line);
    }

    Ok(())
}

/// Lines reported once the config file has been committed
fn summary(report: &SyncReport, config_file: &str) -> Vec<String> {
    let mut lines: Vec<String> = report
        .added
        .iter()
        .map(|profile| format!("Added profile {}", profile))
        .chain(
            report
                .updated
                .iter()
                .map(|profile| format!("Updated profile {}", profile)),
        )
        .collect();

    if report.is_noop() {
        lines.push(format!("{} AWS config already up to date", "✓".green()));
    } else {
        lines.push(format!(
            "{} Updated {} ({} added, {} updated)",
            "✓".green(),
            config_file,
            report.added.len(),
            report.updated.len()
        ));
    }
    lines
}

/// Token, then accounts, then the config file rewrite
pub async fn run_generate(
    config: &Config,
    acquirer: &mut TokenAcquirer,
    enumerator: &AccountEnumerator,
    synchronizer: &ConfigSynchronizer,
    show_diff: bool,
) -> Result<SyncReport> {
    let aws_config_path = config.aws_config_path()?;

    let token = acquirer.acquire().await?;

    println!("Fetching list of all accounts for user");
    let accounts = enumerator.list_accounts(&token).await?;

    let report = synchronizer.sync(&accounts, config, &aws_config_path, show_diff)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_reports_committed_changes() {
        let report = SyncReport {
            added: vec!["Prod".to_string()],
            updated: vec!["Dev".to_string()],
            unchanged: vec!["Sandbox".to_string()],
        };

        let lines = summary(&report, "~/.aws/config");
        assert_eq!(lines[0], "Added profile Prod");
        assert_eq!(lines[1], "Updated profile Dev");
        assert_eq!(lines.len(), 3);
        assert!(lines[2].contains("Updated ~/.aws/config (1 added, 1 updated)"));
        assert!(!lines.iter().any(|line| line.contains("Adding")));
    }

    #[test]
    fn test_summary_for_noop_run() {
        let report = SyncReport {
            unchanged: vec!["Prod".to_string()],
            ..SyncReport::default()
        };

        let lines = summary(&report, "~/.aws/config");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("already up to date"));
    }
}
