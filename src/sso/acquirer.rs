//! Access token acquisition
//!
//! Tries the local token cache first. On a miss it drives the OIDC device
//! authorization grant: register a public client, start the device
//! authorization, send the user to the verification URL and poll
//! `CreateToken` until the user approves, a fatal error occurs or the
//! attempt budget runs out.
//!
//! ```text
//! CacheLookup -> Registering -> AwaitingAuthorization -> Polling
//!      |              |                 |                   |
//!      v              v                 v                   v
//!  Succeeded        Failed            Failed     Succeeded | Failed | TimedOut
//! ```

use super::browser::{BrowserLauncher, SystemBrowser};
use super::cache::TokenCache;
use super::client::{DEVICE_CODE_GRANT_TYPE, DeviceAuthClient};
use super::clock::{Clock, SystemClock};
use super::error::{AcquireError, SsoError};
use super::models::{AccessToken, DeviceAuthSession};
use colored::Colorize;
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

const PROGRESS_EVERY: u32 = 6;

/// Parameters of one acquisition run
#[derive(Debug, Clone)]
pub struct AcquireConfig {
    pub start_url: String,
    pub client_name: String,
    pub client_type: String,
    pub scopes: Vec<String>,
    pub max_attempts: u32,
    pub poll_interval: Duration,
    /// Timeout applied to each individual provider call
    pub call_timeout: Duration,
    /// Overall budget for the whole run, measured from the start of `acquire`
    pub deadline: Option<Duration>,
}

impl AcquireConfig {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            client_name: "aws-sso-config-cli".to_string(),
            client_type: "public".to_string(),
            scopes: vec!["sso-portal:*".to_string()],
            max_attempts: 30,
            poll_interval: Duration::from_secs(5),
            call_timeout: Duration::from_secs(10),
            deadline: Some(Duration::from_secs(5 * 60)),
        }
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireState {
    CacheLookup,
    Registering,
    AwaitingAuthorization,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
}

impl AcquireState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AcquireState::Succeeded | AcquireState::Failed | AcquireState::TimedOut
        )
    }
}

/// Obtains an access token from the cache or through the device flow
pub struct TokenAcquirer {
    client: Arc<dyn DeviceAuthClient>,
    cache: Option<TokenCache>,
    browser: Box<dyn BrowserLauncher>,
    clock: Arc<dyn Clock>,
    config: AcquireConfig,
    state: AcquireState,
    attempts: u32,
    progress_notices: u32,
}

impl TokenAcquirer {
    /// Acquirer using the system browser and real time
    ///
    /// Pass `None` as cache to always run the device flow.
    pub fn new(
        client: Arc<dyn DeviceAuthClient>,
        cache: Option<TokenCache>,
        config: AcquireConfig,
    ) -> Self {
        Self {
            client,
            cache,
            browser: Box::new(SystemBrowser),
            clock: Arc::new(SystemClock),
            config,
            state: AcquireState::CacheLookup,
            attempts: 0,
            progress_notices: 0,
        }
    }

    pub fn with_browser(mut self, browser: impl BrowserLauncher + 'static) -> Self {
        self.browser = Box::new(browser);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// State reached by the last run
    pub fn state(&self) -> AcquireState {
        self.state
    }

    /// Number of `CreateToken` calls made by the last run
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Number of "still waiting" notices shown during the last run
    pub fn progress_notices(&self) -> u32 {
        self.progress_notices
    }

    pub async fn acquire(&mut self) -> Result<AccessToken, AcquireError> {
        self.attempts = 0;
        self.progress_notices = 0;
        let deadline = self.config.deadline.map(|budget| self.clock.now() + budget);

        self.transition(AcquireState::CacheLookup);
        if let Some(token) = self.cache.as_ref().and_then(TokenCache::resolve) {
            info!("Found valid SSO token in cache, skipping login");
            self.transition(AcquireState::Succeeded);
            return Ok(token);
        }

        let session = self.authorize_device().await?;

        println!("Opening browser for AWS SSO login...");
        println!("{}", session.verification_url.cyan());
        if let Some(code) = &session.user_code {
            println!("Verification code: {}", code.bold());
        }
        if let Err(e) = self.browser.open(&session.verification_url) {
            warn!("Failed to open browser: {}", e);
            println!(
                "Failed to open browser automatically. Please manually open: {}",
                session.verification_url
            );
        }
        println!("Waiting for authorization... (this may take a few moments)");

        self.poll(&session, deadline).await
    }

    async fn authorize_device(&mut self) -> Result<DeviceAuthSession, AcquireError> {
        self.transition(AcquireState::Registering);
        let timeout = self.config.call_timeout;

        let registration = with_timeout(
            "RegisterClient",
            timeout,
            self.client.register_client(
                &self.config.client_name,
                &self.config.client_type,
                &self.config.scopes,
            ),
        )
        .await
        .map_err(|e| self.fail(AcquireError::Registration(e)))?;
        debug!("Registered OIDC client {}", registration.client_id);

        self.transition(AcquireState::AwaitingAuthorization);
        let authorization = with_timeout(
            "StartDeviceAuthorization",
            timeout,
            self.client.start_device_authorization(
                &registration.client_id,
                &registration.client_secret,
                &self.config.start_url,
            ),
        )
        .await
        .map_err(|e| self.fail(AcquireError::Authorization(e)))?;

        let verification_url = match authorization.verification_url() {
            Some(url) => url.to_string(),
            None => {
                let e = SsoError::InvalidResponse(
                    "device authorization returned no verification URL".to_string(),
                );
                return Err(self.fail(AcquireError::Authorization(e)));
            }
        };

        Ok(DeviceAuthSession {
            client_id: registration.client_id,
            client_secret: registration.client_secret,
            device_code: authorization.device_code,
            verification_url,
            user_code: authorization.user_code,
        })
    }

    async fn poll(
        &mut self,
        session: &DeviceAuthSession,
        deadline: Option<Instant>,
    ) -> Result<AccessToken, AcquireError> {
        self.transition(AcquireState::Polling);
        let max_attempts = self.config.max_attempts;

        for attempt in 1..=max_attempts {
            let mut timeout = self.config.call_timeout;
            if let Some(deadline) = deadline {
                let now = self.clock.now();
                if now >= deadline {
                    debug!("Polling deadline reached before attempt {}", attempt);
                    return Err(self.time_out());
                }
                timeout = timeout.min(deadline - now);
            }

            self.attempts = attempt;
            let result = with_timeout(
                "CreateToken",
                timeout,
                self.client.create_token(
                    &session.client_id,
                    &session.client_secret,
                    &session.device_code,
                    DEVICE_CODE_GRANT_TYPE,
                ),
            )
            .await;

            match result {
                Ok(token) => {
                    println!("{} Authorization successful!", "✓".green());
                    self.transition(AcquireState::Succeeded);
                    return Ok(token);
                }
                Err(e) if e.is_pending() => {
                    debug!("Attempt {}/{}: {}", attempt, max_attempts, e);
                    if attempt % PROGRESS_EVERY == 0 {
                        self.progress_notices += 1;
                        info!("Device authorization still pending after {} attempts", attempt);
                        println!(
                            "Still waiting for authorization... (attempt {}/{})",
                            attempt, max_attempts
                        );
                    }
                    if attempt < max_attempts {
                        self.clock.sleep(self.config.poll_interval).await;
                    }
                }
                Err(SsoError::Timeout { .. })
                    if deadline.is_some_and(|deadline| self.clock.now() >= deadline) =>
                {
                    return Err(self.time_out());
                }
                Err(e) => return Err(self.fail(AcquireError::Polling(e))),
            }
        }

        Err(self.time_out())
    }

    fn transition(&mut self, next: AcquireState) {
        debug!("Token acquisition: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, error: AcquireError) -> AcquireError {
        warn!("Token acquisition failed: {}", error);
        self.transition(AcquireState::Failed);
        error
    }

    fn time_out(&mut self) -> AcquireError {
        self.transition(AcquireState::TimedOut);
        AcquireError::TimedOut {
            attempts: self.attempts,
        }
    }
}

async fn with_timeout<T>(
    operation: &'static str,
    after: Duration,
    call: impl Future<Output = Result<T, SsoError>>,
) -> Result<T, SsoError> {
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_) => Err(SsoError::Timeout { operation, after }),
    }
}
