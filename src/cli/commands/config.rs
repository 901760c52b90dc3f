use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Args)]
pub struct ConfigCommands {
    /// Path to the aws-sso-config settings file (defaults to ~/.awsssoconfig)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Show all settings
    List,
    /// Get the value of a setting (e.g. sso.start_url)
    Get {
        /// Setting name
        key: String,
    },
    /// Set the value of a setting
    Set {
        /// Setting name
        key: String,
        /// Setting value
        value: String,
    },
    /// Reset a setting to its default value
    Unset {
        /// Setting name
        key: String,
    },
}
