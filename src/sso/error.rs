//! Error types for the SSO token and account APIs

use std::time::Duration;
use thiserror::Error;

/// Error returned by a single call against the identity provider
#[derive(Debug, Error)]
pub enum SsoError {
    /// The user has not completed the device authorization yet
    #[error("authorization_pending: the user has not yet approved the device")]
    AuthorizationPending,

    /// The provider asked the client to poll less frequently
    #[error("slow_down: polling too frequently")]
    SlowDown,

    /// The provider answered with a non-success status
    #[error("{code} ({status}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("invalid response from provider: {0}")]
    InvalidResponse(String),

    #[error("no SSO token provided")]
    MissingToken,

    #[error("failed to list accounts: {0}")]
    ListAccounts(#[source] Box<SsoError>),

    #[error("failed to list roles for account {account_id}: {source}")]
    ListAccountRoles {
        account_id: String,
        #[source]
        source: Box<SsoError>,
    },
}

impl SsoError {
    /// Whether this error only means "keep polling"
    ///
    /// Besides the dedicated variants, API errors are matched on their code
    /// and message text so that backends reporting the condition through a
    /// generic error still classify correctly.
    pub fn is_pending(&self) -> bool {
        match self {
            SsoError::AuthorizationPending | SsoError::SlowDown => true,
            SsoError::Api { code, message, .. } => {
                mentions_pending(code) || mentions_pending(message)
            }
            _ => false,
        }
    }
}

fn mentions_pending(text: &str) -> bool {
    let text = text.to_ascii_lowercase();
    ["authorization_pending", "authorizationpending", "slow_down", "slowdown"]
        .iter()
        .any(|needle| text.contains(needle))
}

/// Terminal failure of a token acquisition run
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("failed to register client: {0}")]
    Registration(#[source] SsoError),

    #[error("failed to start device authorization: {0}")]
    Authorization(#[source] SsoError),

    #[error("authorization error: {0}")]
    Polling(#[source] SsoError),

    #[error("authorization timed out after {attempts} attempts, please try again")]
    TimedOut { attempts: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedicated_variants_are_pending() {
        assert!(SsoError::AuthorizationPending.is_pending());
        assert!(SsoError::SlowDown.is_pending());
        assert!(!SsoError::MissingToken.is_pending());
    }

    #[test]
    fn test_api_error_text_classification() {
        let pending = SsoError::Api {
            status: 400,
            code: "AuthorizationPendingException".to_string(),
            message: String::new(),
        };
        assert!(pending.is_pending());

        let slow = SsoError::Api {
            status: 400,
            code: "InvalidRequest".to_string(),
            message: "slow_down".to_string(),
        };
        assert!(slow.is_pending());

        let denied = SsoError::Api {
            status: 400,
            code: "access_denied".to_string(),
            message: "user denied the request".to_string(),
        };
        assert!(!denied.is_pending());
    }

    #[test]
    fn test_role_listing_error_mentions_account() {
        let err = SsoError::ListAccountRoles {
            account_id: "123456789012".to_string(),
            source: Box::new(SsoError::MissingToken),
        };
        assert!(err.to_string().contains("123456789012"));
    }
}
