use crate::config::{Config, KEYS};
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Set the value of a setting and save the settings file
///
/// # Arguments
/// * `config_path` - Settings file, or `None` for the default location
/// * `key` - Setting name
/// * `value` - New value
///
/// # Returns
/// * `Ok(())` - Setting saved
/// * `Err(anyhow::Error)` - Unknown key or the file could not be written
pub async fn set_command(config_path: Option<&Path>, key: String, value: String) -> Result<()> {
    info!("Setting {} to {}", key, value);

    let mut config = Config::load(config_path)?;
    config
        .set(&key, &value)
        .with_context(|| format!("Valid keys are: {}", KEYS.join(", ")))?;
    save(&config, config_path)?;

    println!("Set {} to {}", key, value);
    Ok(())
}

pub(super) fn save(config: &Config, config_path: Option<&Path>) -> Result<()> {
    match config_path {
        Some(path) => config.save(path),
        None => config.save(&Config::default_path()?),
    }
}
