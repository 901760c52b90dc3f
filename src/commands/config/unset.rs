use super::set::save;
use crate::config::Config;
use anyhow::Result;
use log::info;
use std::path::Path;

/// Reset a setting to its default value
pub async fn unset_command(config_path: Option<&Path>, key: String) -> Result<()> {
    info!("Resetting setting: {}", key);

    let mut config = Config::load(config_path)?;
    config.unset(&key)?;
    save(&config, config_path)?;

    println!("Reset {} to {}", key, config.get(&key)?);
    Ok(())
}
