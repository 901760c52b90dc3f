//! Capability traits over the identity provider
//!
//! The token and account logic only ever talks to these traits, so it can be
//! driven against the real HTTP backend or an in-memory double.

use super::error::SsoError;
use super::models::{AccessToken, AccountInfo, ClientRegistration, DeviceAuthorization, Page, RoleInfo};
use async_trait::async_trait;

pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// OIDC device-authorization operations
#[async_trait]
pub trait DeviceAuthClient: Send + Sync {
    async fn register_client(
        &self,
        client_name: &str,
        client_type: &str,
        scopes: &[String],
    ) -> Result<ClientRegistration, SsoError>;

    async fn start_device_authorization(
        &self,
        client_id: &str,
        client_secret: &str,
        start_url: &str,
    ) -> Result<DeviceAuthorization, SsoError>;

    async fn create_token(
        &self,
        client_id: &str,
        client_secret: &str,
        device_code: &str,
        grant_type: &str,
    ) -> Result<AccessToken, SsoError>;
}

/// SSO portal listing operations, one page per call
#[async_trait]
pub trait PortalClient: Send + Sync {
    async fn list_accounts(
        &self,
        token: &AccessToken,
        next_token: Option<&str>,
    ) -> Result<Page<AccountInfo>, SsoError>;

    async fn list_account_roles(
        &self,
        token: &AccessToken,
        account_id: &str,
        next_token: Option<&str>,
    ) -> Result<Page<RoleInfo>, SsoError>;
}
