//! AWS CLI config file handling

pub mod diff;
pub mod document;
pub mod sync;

pub use diff::{DiffDisplay, ExternalDiff};
pub use document::{ConfigDocument, DocumentError};
pub use sync::{ConfigSynchronizer, ProfileSettings, SyncError, SyncReport, apply_accounts, profile_name, staged_path};
