//! Synchronization of `[profile <name>]` sections with the SSO account list
//!
//! The updated file is staged next to the original as `<path>.new` and then
//! renamed over it. The rename is the only commit point: any failure before
//! it leaves the original file untouched.

use super::diff::{DiffDisplay, ExternalDiff};
use super::document::{ConfigDocument, DocumentError};
use crate::config::Config;
use crate::sso::AccountInfo;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    #[error("failed to save config file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to rename config file to {path:?}: {source}")]
    Commit {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Values written into every managed profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSettings {
    pub role_name: String,
    pub sso_region: String,
    pub sso_start_url: String,
    pub region: String,
}

impl ProfileSettings {
    /// The five managed keys for one account, in write order
    pub fn entries<'a>(&'a self, account_id: &'a str) -> [(&'static str, &'a str); 5] {
        [
            ("sso_account_id", account_id),
            ("sso_role_name", self.role_name.as_str()),
            ("sso_region", self.sso_region.as_str()),
            ("sso_start_url", self.sso_start_url.as_str()),
            ("region", self.region.as_str()),
        ]
    }
}

impl From<&Config> for ProfileSettings {
    fn from(config: &Config) -> Self {
        Self {
            role_name: config.sso.role.clone(),
            sso_region: config.sso.region.clone(),
            sso_start_url: config.sso.start_url.clone(),
            region: config.aws.default_region.clone(),
        }
    }
}

/// Profiles touched by a run, by profile name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty()
    }
}

/// Profile name used for an account
pub fn profile_name(account: &AccountInfo) -> &str {
    if account.account_name.trim().is_empty() {
        account.account_id.as_str()
    } else {
        account.account_name.trim()
    }
}

/// Applies the managed keys for every account to `document`
pub fn apply_accounts(
    document: &mut ConfigDocument,
    accounts: &[AccountInfo],
    settings: &ProfileSettings,
) -> SyncReport {
    let mut report = SyncReport::default();
    let mut seen = HashSet::new();

    for account in accounts {
        let profile = profile_name(account);
        if !seen.insert(profile.to_string()) {
            warn!(
                "Several accounts are named {:?}; profile now points at {}",
                profile, account.account_id
            );
        }

        let section = format!("profile {}", profile);
        let existed = document.has_section(&section);

        let mut changed = false;
        for (key, value) in settings.entries(&account.account_id) {
            changed |= document.set(&section, key, value);
        }

        let bucket = match (existed, changed) {
            (false, _) => &mut report.added,
            (true, true) => &mut report.updated,
            (true, false) => &mut report.unchanged,
        };
        if !bucket.iter().any(|name| name == profile) {
            bucket.push(profile.to_string());
        }
    }

    report
}

/// `<path>.new`
pub fn staged_path(config_path: &Path) -> PathBuf {
    let mut staged = OsString::from(config_path.as_os_str());
    staged.push(".new");
    PathBuf::from(staged)
}

pub struct ConfigSynchronizer {
    diff: Box<dyn DiffDisplay>,
}

impl Default for ConfigSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSynchronizer {
    pub fn new() -> Self {
        Self {
            diff: Box::new(ExternalDiff),
        }
    }

    pub fn with_diff(diff: impl DiffDisplay + 'static) -> Self {
        Self {
            diff: Box::new(diff),
        }
    }

    /// Merges `accounts` into the AWS config file at `config_path`
    ///
    /// The file must already exist and parse; it is never created from scratch.
    pub fn sync(
        &self,
        accounts: &[AccountInfo],
        config: &Config,
        config_path: &Path,
        show_diff: bool,
    ) -> Result<SyncReport, SyncError> {
        debug!("Synchronizing {} accounts into {:?}", accounts.len(), config_path);

        let content = fs::read_to_string(config_path).map_err(|source| SyncError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        let mut document = ConfigDocument::parse(&content).map_err(|source| SyncError::Parse {
            path: config_path.to_path_buf(),
            source,
        })?;

        let report = apply_accounts(&mut document, accounts, &ProfileSettings::from(config));

        let staged = staged_path(config_path);
        if let Err(source) = fs::write(&staged, document.render()) {
            discard(&staged);
            return Err(SyncError::Write {
                path: staged,
                source,
            });
        }
        if let Ok(metadata) = fs::metadata(config_path) {
            if let Err(e) = fs::set_permissions(&staged, metadata.permissions()) {
                warn!("Could not copy permissions onto {:?}: {}", staged, e);
            }
        }

        if show_diff {
            if let Err(e) = self.diff.show(config_path, &staged) {
                warn!("Failed to show diff: {}", e);
                println!("Unable to show diff: {}", e);
            }
        }

        if let Err(source) = fs::rename(&staged, config_path) {
            discard(&staged);
            return Err(SyncError::Commit {
                path: config_path.to_path_buf(),
                source,
            });
        }

        info!(
            "Config file {:?} updated: {} added, {} updated, {} unchanged",
            config_path,
            report.added.len(),
            report.updated.len(),
            report.unchanged.len()
        );
        Ok(report)
    }
}

fn discard(staged: &Path) {
    if staged.is_file() {
        if let Err(e) = fs::remove_file(staged) {
            debug!("Could not remove {:?}: {}", staged, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ProfileSettings {
        ProfileSettings {
            role_name: "ReadOnly".to_string(),
            sso_region: "eu-west-1".to_string(),
            sso_start_url: "https://acme.awsapps.com/start".to_string(),
            region: "eu-central-1".to_string(),
        }
    }

    #[test]
    fn test_staged_path_appends_suffix() {
        assert_eq!(
            staged_path(Path::new("/home/u/.aws/config")),
            PathBuf::from("/home/u/.aws/config.new")
        );
    }

    #[test]
    fn test_report_classifies_profiles() {
        let mut document = ConfigDocument::parse(
            "[profile Prod]\nsso_account_id = 1\nsso_role_name = ReadOnly\nsso_region = eu-west-1\nsso_start_url = https://acme.awsapps.com/start\nregion = eu-central-1\n\n[profile Dev]\nsso_account_id = 2\n",
        )
        .unwrap();
        let accounts = vec![
            AccountInfo::new("1", "Prod"),
            AccountInfo::new("2", "Dev"),
            AccountInfo::new("3", "Sandbox"),
        ];

        let report = apply_accounts(&mut document, &accounts, &settings());
        assert_eq!(report.unchanged, vec!["Prod"]);
        assert_eq!(report.updated, vec!["Dev"]);
        assert_eq!(report.added, vec!["Sandbox"]);
        assert!(!report.is_noop());
    }

    #[test]
    fn test_existing_unmanaged_keys_are_kept() {
        let mut document =
            ConfigDocument::parse("[profile Prod]\noutput = json\nregion = us-east-1\n").unwrap();
        apply_accounts(&mut document, &[AccountInfo::new("1", "Prod")], &settings());

        assert_eq!(document.get("profile Prod", "output"), Some("json"));
        assert_eq!(document.get("profile Prod", "region"), Some("eu-central-1"));
        assert_eq!(document.get("profile Prod", "sso_role_name"), Some("ReadOnly"));
    }

    #[test]
    fn test_unnamed_account_falls_back_to_id() {
        let account = AccountInfo::new("111122223333", "  ");
        assert_eq!(profile_name(&account), "111122223333");
    }
}
