use crate::config::Config;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

/// Print every setting as `key = value`
pub async fn list_command(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;

    for (key, value) in config.list() {
        println!("{} = {}", key.bold(), value);
    }

    Ok(())
}
