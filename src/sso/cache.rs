//! Lookup of still-valid access tokens in the local SSO token cache
//!
//! The cache is written by the AWS CLI (`aws sso login`); this module only
//! ever reads it. Every failure while inspecting a file downgrades to "no
//! token in this file".

use super::models::AccessToken;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CACHE_SUFFIX: &str = ".json";

/// Record stored in a cache file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedToken {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub expires_at: String,
}

impl CachedToken {
    /// Expiry of the record, or `None` if it is missing or unparsable
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        parse_expiry(&self.expires_at)
    }

    /// Token if the record is complete and `now` is before its expiry
    pub fn valid_at(&self, now: DateTime<Utc>) -> Option<AccessToken> {
        if self.access_token.is_empty() {
            return None;
        }
        let expires_at = self.expiry()?;
        if now < expires_at {
            Some(AccessToken::new(self.access_token.clone()))
        } else {
            None
        }
    }
}

/// Parses `expiresAt`, accepting RFC3339 and the `...UTC` form older CLIs write
fn parse_expiry(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let parsed = DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            let naive = value.strip_suffix("UTC")?;
            NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc())
        })?;

    // A zero timestamp means the field was never filled in
    if parsed.timestamp() <= 0 {
        return None;
    }
    Some(parsed)
}

/// Reads the SSO token cache directory
#[derive(Debug, Clone)]
pub struct TokenCache {
    dir: PathBuf,
}

impl TokenCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.aws/sso/cache`
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".aws").join("sso").join("cache"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First cached token that is still valid now
    pub fn resolve(&self) -> Option<AccessToken> {
        self.resolve_at(Utc::now())
    }

    /// First cached token that is still valid at `now`
    ///
    /// Directory order is whatever the filesystem returns; when several
    /// files hold valid tokens, which one wins is unspecified.
    pub fn resolve_at(&self, now: DateTime<Utc>) -> Option<AccessToken> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Token cache {:?} not readable: {}", self.dir, e);
                return None;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let is_candidate = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(CACHE_SUFFIX));
            if !is_candidate || !path.is_file() {
                continue;
            }

            if let Some(token) = read_record(&path).and_then(|record| record.valid_at(now)) {
                debug!("Using cached SSO token from {:?}", path);
                return Some(token);
            }
        }

        debug!("No valid cached SSO token in {:?}", self.dir);
        None
    }
}

fn read_record(path: &Path) -> Option<CachedToken> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Skipping unreadable token cache file {:?}: {}", path, e);
            return None;
        }
    };

    // Other tools keep unrelated JSON in the same directory
    match serde_json::from_str::<CachedToken>(&content) {
        Ok(record) => Some(record),
        Err(e) => {
            debug!("Skipping {:?}: not a token cache record ({})", path, e);
            None
        }
    }
}
