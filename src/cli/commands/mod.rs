pub mod config;
pub mod generate;

pub use config::{ConfigCommands, ConfigSubcommands};
pub use generate::GenerateArgs;
