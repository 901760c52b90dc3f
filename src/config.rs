use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "AWS_SSO_CONFIG_";

/// Keys accepted by [`Config::get`], [`Config::set`] and [`Config::unset`]
pub const KEYS: [&str; 5] = [
    "sso.start_url",
    "sso.region",
    "sso.role",
    "aws.default_region",
    "aws.config_file",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsoConfig {
    pub start_url: String,
    pub region: String,
    pub role: String,
}

impl Default for SsoConfig {
    fn default() -> Self {
        Self {
            start_url: "https://your-sso-portal.awsapps.com/start".to_string(),
            region: "us-east-1".to_string(),
            role: "AdministratorAccess".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    pub default_region: String,
    pub config_file: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            default_region: "us-east-1".to_string(),
            config_file: "~/.aws/config".to_string(),
        }
    }
}

/// Application configuration, stored as TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sso: SsoConfig,
    #[serde(default)]
    pub aws: AwsConfig,
}

impl Config {
    /// `~/.awsssoconfig`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".awsssoconfig"))
    }

    /// Loads the config at `path`, or the default location
    ///
    /// A missing file is created with default content first.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, creating default config");
            Self::default().save(&config_path)?;
        }

        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let mut config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
        config.fill_defaults();

        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        debug!("Saving config to: {:?}", path);

        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {:?}", dir))?;
        }

        let config_content =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(path, config_content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        info!("Config saved successfully");
        Ok(())
    }

    /// Replaces empty values with their defaults
    pub fn fill_defaults(&mut self) {
        let defaults = Self::default();
        for key in KEYS {
            if self.value(key).is_some_and(str::is_empty) {
                let default = defaults.value(key).unwrap_or_default().to_string();
                if let Some(slot) = self.value_mut(key) {
                    *slot = default;
                }
            }
        }
    }

    /// Applies `AWS_SSO_CONFIG_<SECTION>_<KEY>` variables
    ///
    /// Takes the variables explicitly; the binary passes `std::env::vars()`.
    pub fn apply_env_overrides<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(suffix) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let key = KEYS
                .iter()
                .find(|key| key.replace('.', "_").eq_ignore_ascii_case(suffix));
            if let Some(key) = key {
                if value.is_empty() {
                    continue;
                }
                debug!("Overriding {} from {}", key, name);
                if let Some(slot) = self.value_mut(key) {
                    *slot = value;
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sso.start_url.is_empty() {
            anyhow::bail!("SSO start URL is required");
        }
        if self.sso.region.is_empty() {
            anyhow::bail!("SSO region is required");
        }
        if self.aws.default_region.is_empty() {
            anyhow::bail!("AWS default region is required");
        }
        if self.aws.config_file.is_empty() {
            anyhow::bail!("AWS config file path is required");
        }
        Ok(())
    }

    /// Path of the AWS CLI config file with `~` expanded
    pub fn aws_config_path(&self) -> Result<PathBuf> {
        expand_home(&self.aws.config_file)
    }

    pub fn get(&self, key: &str) -> Result<&str> {
        self.value(key)
            .ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {}", key))
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let slot = self
            .value_mut(key)
            .ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {}", key))?;
        *slot = value.to_string();
        Ok(())
    }

    /// Resets `key` to its default value
    pub fn unset(&mut self, key: &str) -> Result<()> {
        let defaults = Self::default();
        let default = defaults.get(key)?;
        self.set(key, default)
    }

    pub fn list(&self) -> Vec<(&'static str, &str)> {
        KEYS.iter()
            .filter_map(|key| self.value(key).map(|value| (*key, value)))
            .collect()
    }

    fn value(&self, key: &str) -> Option<&str> {
        let value = match key {
            "sso.start_url" => &self.sso.start_url,
            "sso.region" => &self.sso.region,
            "sso.role" => &self.sso.role,
            "aws.default_region" => &self.aws.default_region,
            "aws.config_file" => &self.aws.config_file,
            _ => return None,
        };
        Some(value.as_str())
    }

    fn value_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "sso.start_url" => Some(&mut self.sso.start_url),
            "sso.region" => Some(&mut self.sso.region),
            "sso.role" => Some(&mut self.sso.role),
            "aws.default_region" => Some(&mut self.aws.default_region),
            "aws.config_file" => Some(&mut self.aws.config_file),
            _ => None,
        }
    }
}

fn expand_home(path: &str) -> Result<PathBuf> {
    if path == "~" {
        return dirs::home_dir().context("Failed to get home directory");
    }
    match path.strip_prefix("~/") {
        Some(rest) => Ok(dirs::home_dir()
            .context("Failed to get home directory")?
            .join(rest)),
        None => Ok(PathBuf::from(path)),
    }
}
