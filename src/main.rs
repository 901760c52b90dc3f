use anyhow::Result;
use clap::Parser;
use log::info;

use aws_sso_config::cli::commands::ConfigSubcommands;
use aws_sso_config::cli::{Cli, Commands};
use aws_sso_config::commands::config::{get_command, list_command, set_command, unset_command};
use aws_sso_config::commands::{GenerateOptions, generate_command};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    info!("Starting aws-sso-config");

    match cli.command {
        Commands::Generate(args) => {
            generate_command(GenerateOptions {
                diff: args.diff,
                config_path: args.config,
            })
            .await
        }
        Commands::Config(config) => {
            let path = config.config.as_deref();
            match config.command {
                ConfigSubcommands::List => list_command(path).await,
                ConfigSubcommands::Get { key } => get_command(path, key).await,
                ConfigSubcommands::Set { key, value } => set_command(path, key, value).await,
                ConfigSubcommands::Unset { key } => unset_command(path, key).await,
            }
        }
    }
}
