//! AWS SSO access: token cache, device authorization and account listing

pub mod accounts;
pub mod acquirer;
pub mod browser;
pub mod cache;
pub mod client;
pub mod clock;
pub mod error;
pub mod http;
pub mod models;

pub use accounts::AccountEnumerator;
pub use acquirer::{AcquireConfig, AcquireState, TokenAcquirer};
pub use browser::{BrowserLauncher, SystemBrowser};
pub use cache::{CachedToken, TokenCache};
pub use client::{DEVICE_CODE_GRANT_TYPE, DeviceAuthClient, PortalClient};
pub use clock::{Clock, SystemClock};
pub use error::{AcquireError, SsoError};
pub use http::HttpSsoClient;
pub use models::{AccessToken, AccountInfo, ClientRegistration, DeviceAuthSession, DeviceAuthorization, Page, RoleInfo};
