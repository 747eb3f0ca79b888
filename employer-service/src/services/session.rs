use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::database::AccountStore;
use super::error::ServiceError;
use super::jwt::JwtService;
use crate::models::Account;

/// Issues session tokens and resolves bearers back to accounts.
#[derive(Clone)]
pub struct SessionService {
    accounts: Arc<dyn AccountStore>,
    jwt: JwtService,
}

impl SessionService {
    pub fn new(accounts: Arc<dyn AccountStore>, jwt: JwtService) -> Self {
        Self { accounts, jwt }
    }

    pub fn issue(&self, account: &Account, now: DateTime<Utc>) -> Result<String, ServiceError> {
        Ok(self.jwt.issue(account, now)?)
    }

    /// Validate `token` as of `now` and load the account it names. Every
    /// failure is an authentication error.
    pub async fn authenticate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Account, ServiceError> {
        let claims = self.jwt.validate(token, now).map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            ServiceError::Unauthorized("Invalid or expired token.".to_string())
        })?;

        self.accounts
            .find_account_by_id(&claims.sub)
            .await?
            .ok_or_else(|| {
                tracing::warn!(account_id = %claims.sub, "Token names an unknown account");
                ServiceError::Unauthorized("Invalid or expired token.".to_string())
            })
    }
}
