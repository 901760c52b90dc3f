use crate::config::Config;
use anyhow::Result;
use log::info;
use std::path::Path;

/// Print the value of a single setting
///
/// # Arguments
/// * `config_path` - Settings file, or `None` for the default location
/// * `key` - Setting name, e.g. `sso.start_url`
///
/// # Returns
/// * `Ok(())` - Value printed
/// * `Err(anyhow::Error)` - Unreadable settings file or unknown key
pub async fn get_command(config_path: Option<&Path>, key: String) -> Result<()> {
    info!("Getting setting: {}", key);

    let config = Config::load(config_path)?;
    println!("{}", config.get(&key)?);

    Ok(())
}
