//! Enumeration of the accounts and roles visible to an SSO identity

use super::client::PortalClient;
use super::error::SsoError;
use super::models::{AccessToken, AccountInfo, Page, RoleInfo};
use log::{debug, info};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AccountEnumerator {
    client: Arc<dyn PortalClient>,
    call_timeout: Duration,
}

impl AccountEnumerator {
    pub fn new(client: Arc<dyn PortalClient>) -> Self {
        Self {
            client,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// All accounts the token can see, across every page, in provider order
    pub async fn list_accounts(&self, token: &AccessToken) -> Result<Vec<AccountInfo>, SsoError> {
        if token.is_empty() {
            return Err(SsoError::MissingToken);
        }

        let accounts = collect_pages("ListAccounts", self.call_timeout, |next| async move {
            self.client.list_accounts(token, next.as_deref()).await
        })
        .await
        .map_err(|e| SsoError::ListAccounts(Box::new(e)))?;

        info!("Found {} accounts", accounts.len());
        Ok(accounts)
    }

    /// All roles the token may assume in `account_id`
    pub async fn list_account_roles(
        &self,
        token: &AccessToken,
        account_id: &str,
    ) -> Result<Vec<RoleInfo>, SsoError> {
        if token.is_empty() {
            return Err(SsoError::MissingToken);
        }

        let roles = collect_pages("ListAccountRoles", self.call_timeout, |next| async move {
            self.client
                .list_account_roles(token, account_id, next.as_deref())
                .await
        })
        .await
        .map_err(|e| SsoError::ListAccountRoles {
            account_id: account_id.to_string(),
            source: Box::new(e),
        })?;

        debug!("Account {} has {} roles", account_id, roles.len());
        Ok(roles)
    }
}

/// Follows continuation tokens until the provider stops returning one
async fn collect_pages<T, F, Fut>(
    operation: &'static str,
    call_timeout: Duration,
    mut fetch: F,
) -> Result<Vec<T>, SsoError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, SsoError>>,
{
    let mut items = Vec::new();
    let mut next_token: Option<String> = None;
    let mut seen_tokens = HashSet::new();
    let mut pages = 0usize;

    loop {
        let page = match tokio::time::timeout(call_timeout, fetch(next_token.clone())).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(SsoError::Timeout {
                    operation,
                    after: call_timeout,
                });
            }
        };
        pages += 1;
        items.extend(page.items);

        match page.next_token.filter(|next| !next.is_empty()) {
            // A token handed out twice means the listing would never end
            Some(next) if !seen_tokens.insert(next.clone()) => {
                return Err(SsoError::InvalidResponse(format!(
                    "{} returned the same continuation token twice",
                    operation
                )));
            }
            Some(next) => next_token = Some(next),
            None => break,
        }
    }

    debug!("{} returned {} items over {} pages", operation, items.len(), pages);
    Ok(items)
}
