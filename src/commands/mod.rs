pub mod config;
pub mod generate;

pub use generate::{GenerateOptions, generate_command, run_generate};
