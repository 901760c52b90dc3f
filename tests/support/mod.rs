//! In-memory doubles shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use aws_sso_config::config::Config;
use aws_sso_config::profile::DiffDisplay;
use aws_sso_config::sso::{
    AccessToken, AccountInfo, BrowserLauncher, ClientRegistration, Clock, DeviceAuthClient,
    DeviceAuthorization, Page, PortalClient, RoleInfo, SsoError,
};
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const VERIFICATION_URL: &str = "https://device.sso.us-east-1.amazonaws.com/?user_code=WXYZ-1234";

/// Scripted OIDC backend
///
/// `CreateToken` answers from `token_script` in order and reports
/// `authorization_pending` once the script is exhausted.
#[derive(Default)]
pub struct FakeDeviceAuth {
    pub fail_register: bool,
    pub fail_authorize: bool,
    pub token_script: Mutex<VecDeque<Result<AccessToken, SsoError>>>,
    pub register_calls: AtomicU32,
    pub authorize_calls: AtomicU32,
    pub create_calls: AtomicU32,
    pub grant_types: Mutex<Vec<String>>,
}

impl FakeDeviceAuth {
    pub fn with_script(script: Vec<Result<AccessToken, SsoError>>) -> Self {
        Self {
            token_script: Mutex::new(script.into()),
            ..Self::default()
        }
    }

    pub fn registers(&self) -> u32 {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn authorizations(&self) -> u32 {
        self.authorize_calls.load(Ordering::SeqCst)
    }

    pub fn token_calls(&self) -> u32 {
        self.create_calls.load(Ordering::SeqCst)
    }
}

pub fn api_error(code: &str) -> SsoError {
    SsoError::Api {
        status: 400,
        code: code.to_string(),
        message: format!("{} from fake backend", code),
    }
}

#[async_trait]
impl DeviceAuthClient for FakeDeviceAuth {
    async fn register_client(
        &self,
        _client_name: &str,
        _client_type: &str,
        _scopes: &[String],
    ) -> Result<ClientRegistration, SsoError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_register {
            return Err(api_error("InvalidClientMetadataException"));
        }
        Ok(ClientRegistration {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
        })
    }

    async fn start_device_authorization(
        &self,
        client_id: &str,
        _client_secret: &str,
        _start_url: &str,
    ) -> Result<DeviceAuthorization, SsoError> {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(client_id, "client-id");
        if self.fail_authorize {
            return Err(api_error("InvalidRequestException"));
        }
        Ok(DeviceAuthorization {
            device_code: "device-code".to_string(),
            user_code: Some("WXYZ-1234".to_string()),
            verification_uri: Some("https://device.sso.us-east-1.amazonaws.com/".to_string()),
            verification_uri_complete: Some(VERIFICATION_URL.to_string()),
        })
    }

    async fn create_token(
        &self,
        _client_id: &str,
        _client_secret: &str,
        device_code: &str,
        grant_type: &str,
    ) -> Result<AccessToken, SsoError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(device_code, "device-code");
        self.grant_types.lock().unwrap().push(grant_type.to_string());
        self.token_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(SsoError::AuthorizationPending))
    }
}

/// Clock that only moves when slept on
pub struct ManualClock {
    start: Instant,
    elapsed: Mutex<Duration>,
    pub sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        *self.elapsed.lock().unwrap() += duration;
        self.sleeps.lock().unwrap().push(duration);
    }
}

#[derive(Clone, Default)]
pub struct FakeBrowser {
    pub fail: bool,
    pub opened: Arc<Mutex<Vec<String>>>,
}

impl FakeBrowser {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl BrowserLauncher for FakeBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no browser available"));
        }
        Ok(())
    }
}

/// Portal serving fixed account pages, chained with `page-N` tokens
#[derive(Default)]
pub struct FakePortal {
    pub account_pages: Vec<Vec<AccountInfo>>,
    pub role_pages: Vec<Vec<RoleInfo>>,
    pub fail_accounts: bool,
    pub fail_roles: bool,
    pub repeat_token: bool,
    /// Continuation tokens handed out in turn, regardless of the page asked for
    pub token_cycle: Vec<String>,
    pub delay: Option<Duration>,
    pub calls: AtomicU32,
    pub seen_tokens: Mutex<Vec<Option<String>>>,
}

impl FakePortal {
    pub fn with_accounts(pages: Vec<Vec<AccountInfo>>) -> Self {
        Self {
            account_pages: pages,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn page<T: Clone>(&self, pages: &[Vec<T>], next_token: Option<&str>) -> Page<T> {
        let index = match next_token {
            None => 0,
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(0),
        };
        let items = pages.get(index).cloned().unwrap_or_default();
        let call = self.call_count() as usize;
        let next_token = if !self.token_cycle.is_empty() {
            Some(self.token_cycle[(call - 1) % self.token_cycle.len()].clone())
        } else if self.repeat_token {
            Some("page-1".to_string())
        } else if index + 1 < pages.len() {
            Some(format!("page-{}", index + 1))
        } else {
            None
        };
        Page { items, next_token }
    }

    async fn enter(&self, next_token: Option<&str>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_tokens
            .lock()
            .unwrap()
            .push(next_token.map(str::to_string));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl PortalClient for FakePortal {
    async fn list_accounts(
        &self,
        token: &AccessToken,
        next_token: Option<&str>,
    ) -> Result<Page<AccountInfo>, SsoError> {
        self.enter(next_token).await;
        assert!(!token.is_empty());
        if self.fail_accounts {
            return Err(api_error("UnauthorizedException"));
        }
        Ok(self.page(&self.account_pages, next_token))
    }

    async fn list_account_roles(
        &self,
        _token: &AccessToken,
        _account_id: &str,
        next_token: Option<&str>,
    ) -> Result<Page<RoleInfo>, SsoError> {
        self.enter(next_token).await;
        if self.fail_roles {
            return Err(api_error("ResourceNotFoundException"));
        }
        Ok(self.page(&self.role_pages, next_token))
    }
}

/// Records the files it was asked to compare
#[derive(Clone, Default)]
pub struct RecordingDiff {
    pub fail: bool,
    pub calls: Arc<Mutex<Vec<(PathBuf, PathBuf, String)>>>,
}

impl DiffDisplay for RecordingDiff {
    fn show(&self, original: &Path, updated: &Path) -> io::Result<()> {
        let staged = std::fs::read_to_string(updated).unwrap_or_default();
        self.calls
            .lock()
            .unwrap()
            .push((original.to_path_buf(), updated.to_path_buf(), staged));
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::NotFound, "diff not installed"));
        }
        Ok(())
    }
}

/// App settings used by the end-to-end scenarios
pub fn app_config(aws_config_file: &Path) -> Config {
    let mut config = Config::default();
    config.sso.role = "AdministratorAccess".to_string();
    config.sso.region = "us-west-2".to_string();
    config.sso.start_url = "https://x.awsapps.com/start".to_string();
    config.aws.default_region = "us-east-1".to_string();
    config.aws.config_file = aws_config_file.to_string_lossy().into_owned();
    config
}

pub fn accounts() -> Vec<AccountInfo> {
    vec![
        AccountInfo::new("123456789012", "Prod"),
        AccountInfo::new("987654321098", "Dev"),
    ]
}

pub fn cache_record(token: &str, expires_in: chrono::Duration) -> String {
    serde_json::json!({
        "startUrl": "https://x.awsapps.com/start",
        "region": "us-west-2",
        "accessToken": token,
        "expiresAt": (chrono::Utc::now() + expires_in).to_rfc3339(),
    })
    .to_string()
}
