use super::commands::{ConfigCommands, GenerateArgs};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aws-sso-config")]
#[command(version, about = "Generate AWS CLI profiles for every account you can reach through AWS SSO")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate AWS config profiles for all accounts you have access to
    Generate(GenerateArgs),
    /// Manage aws-sso-config settings
    Config(ConfigCommands),
}
