//! Generate AWS CLI config profiles for every account reachable through AWS SSO
//!
//! A run resolves an access token (from the SSO token cache or through the
//! OIDC device authorization flow), lists the accounts visible to it and
//! rewrites the `[profile <name>]` sections of the AWS config file.

pub mod cli;
pub mod commands;
pub mod config;
pub mod profile;
pub mod sso;
