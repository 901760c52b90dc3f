//! HTTP backend for the AWS SSO OIDC and SSO portal APIs

use super::client::{DeviceAuthClient, PortalClient};
use super::error::SsoError;
use super::models::{AccessToken, AccountInfo, ClientRegistration, DeviceAuthorization, Page, RoleInfo};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

const BEARER_HEADER: &str = "x-amz-sso_bearer_token";
const PAGE_SIZE: &str = "100";

/// Talks to `oidc.{region}.amazonaws.com` and `portal.sso.{region}.amazonaws.com`
pub struct HttpSsoClient {
    http_client: reqwest::Client,
    oidc_endpoint: String,
    portal_endpoint: String,
}

impl HttpSsoClient {
    /// Client for the regional AWS endpoints
    pub fn new(region: &str) -> Result<Self, SsoError> {
        Self::with_endpoints(
            format!("https://oidc.{}.amazonaws.com", region),
            format!("https://portal.sso.{}.amazonaws.com", region),
        )
    }

    /// Client for explicit base URLs
    pub fn with_endpoints(
        oidc_endpoint: impl Into<String>,
        portal_endpoint: impl Into<String>,
    ) -> Result<Self, SsoError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("aws-sso-config/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            oidc_endpoint: oidc_endpoint.into().trim_end_matches('/').to_string(),
            portal_endpoint: portal_endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post_oidc<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, SsoError> {
        let url = format!("{}{}", self.oidc_endpoint, path);
        debug!("POST {}", url);

        let response = self.http_client.post(&url).json(&body).send().await?;
        decode(response).await
    }

    async fn get_portal<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &AccessToken,
        query: &[(&str, &str)],
    ) -> Result<T, SsoError> {
        let url = format!("{}{}", self.portal_endpoint, path);
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(&url)
            .header(BEARER_HEADER, token.as_str())
            .query(query)
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, SsoError> {
    let status = response.status();
    debug!("Response status: {}", status);

    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(classify_error(status.as_u16(), &body))
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    #[serde(rename = "__type")]
    error_type: Option<String>,
    message: Option<String>,
    #[serde(rename = "Message")]
    message_upper: Option<String>,
}

/// Maps an error response onto [`SsoError`]
///
/// OIDC errors arrive as `{"error": ..., "error_description": ...}`, portal
/// errors as `{"__type": ..., "message": ...}`.
pub(crate) fn classify_error(status: u16, body: &str) -> SsoError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let code = parsed
        .error
        .or(parsed.error_type.map(|t| {
            // "com.amazonaws.switchboard.portal#UnauthorizedException"
            t.rsplit('#').next().unwrap_or(&t).to_string()
        }))
        .unwrap_or_else(|| format!("HTTP {}", status));

    match code.as_str() {
        "authorization_pending" | "AuthorizationPendingException" => {
            return SsoError::AuthorizationPending;
        }
        "slow_down" | "SlowDownException" => return SsoError::SlowDown,
        _ => {}
    }

    let message = parsed
        .error_description
        .or(parsed.message)
        .or(parsed.message_upper)
        .unwrap_or_else(|| body.trim().to_string());

    SsoError::Api {
        status,
        code,
        message,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListAccountsResponse {
    #[serde(default)]
    account_list: Vec<AccountInfo>,
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListAccountRolesResponse {
    #[serde(default)]
    role_list: Vec<RoleInfo>,
    next_token: Option<String>,
}

#[async_trait]
impl DeviceAuthClient for HttpSsoClient {
    async fn register_client(
        &self,
        client_name: &str,
        client_type: &str,
        scopes: &[String],
    ) -> Result<ClientRegistration, SsoError> {
        let body = serde_json::json!({
            "clientName": client_name,
            "clientType": client_type,
            "scopes": scopes,
        });
        self.post_oidc("/client/register", body).await
    }

    async fn start_device_authorization(
        &self,
        client_id: &str,
        client_secret: &str,
        start_url: &str,
    ) -> Result<DeviceAuthorization, SsoError> {
        let body = serde_json::json!({
            "clientId": client_id,
            "clientSecret": client_secret,
            "startUrl": start_url,
        });
        self.post_oidc("/device_authorization", body).await
    }

    async fn create_token(
        &self,
        client_id: &str,
        client_secret: &str,
        device_code: &str,
        grant_type: &str,
    ) -> Result<AccessToken, SsoError> {
        let body = serde_json::json!({
            "clientId": client_id,
            "clientSecret": client_secret,
            "deviceCode": device_code,
            "grantType": grant_type,
        });
        let response: CreateTokenResponse = self.post_oidc("/token", body).await?;
        Ok(AccessToken::new(response.access_token))
    }
}

#[async_trait]
impl PortalClient for HttpSsoClient {
    async fn list_accounts(
        &self,
        token: &AccessToken,
        next_token: Option<&str>,
    ) -> Result<Page<AccountInfo>, SsoError> {
        let mut query = vec![("max_result", PAGE_SIZE)];
        if let Some(next) = next_token {
            query.push(("next_token", next));
        }

        let response: ListAccountsResponse = self
            .get_portal("/assignment/accounts", token, &query)
            .await?;
        Ok(Page {
            items: response.account_list,
            next_token: response.next_token,
        })
    }

    async fn list_account_roles(
        &self,
        token: &AccessToken,
        account_id: &str,
        next_token: Option<&str>,
    ) -> Result<Page<RoleInfo>, SsoError> {
        let mut query = vec![("account_id", account_id), ("max_result", PAGE_SIZE)];
        if let Some(next) = next_token {
            query.push(("next_token", next));
        }

        let response: ListAccountRolesResponse = self
            .get_portal("/assignment/roles", token, &query)
            .await?;
        Ok(Page {
            items: response.role_list,
            next_token: response.next_token,
        })
    }
}
