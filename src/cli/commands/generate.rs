use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct GenerateArgs {
    /// Show the changes to the AWS config file before applying them
    #[arg(short, long)]
    pub diff: bool,
    /// Path to the aws-sso-config settings file (defaults to ~/.awsssoconfig)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
