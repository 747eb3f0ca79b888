//! Registration and the two-channel verification flow.
//!
//! Every account mutation is a read-modify-write guarded by the account
//! version. A lost race re-reads and re-applies the change, so concurrent
//! email and mobile confirmations both land.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use validator::Validate;

use super::challenge::generate_email_challenge;
use super::clock::Clock;
use super::database::{AccountStore, StoreError};
use super::error::ServiceError;
use super::metrics;
use super::notifier::Notifier;
use super::providers::MobileCheck;
use super::session::SessionService;
use crate::dtos::account::{
    ResendEmailCodeRequest, ResendMobileCodeRequest, SignupRequest, VerifyEmailRequest,
    VerifyMobileRequest,
};
use crate::models::{Account, Channel, NewAccount};

/// Attempts at a versioned write before giving up.
pub const MAX_WRITE_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    notifier: Notifier,
    sessions: SessionService,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        notifier: Notifier,
        sessions: SessionService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            sessions,
            clock,
        }
    }

    /// Create an unverified account and send both challenges.
    pub async fn register(&self, req: SignupRequest) -> Result<Account, ServiceError> {
        let req = SignupRequest {
            name: req.name.trim().to_string(),
            phone_no: req.phone_no.trim().to_string(),
            company_name: req.company_name.trim().to_string(),
            company_email: normalize_email(&req.company_email),
            employee_size: req.employee_size,
        };
        req.validate()?;

        let now = self.clock.now();
        let challenge = generate_email_challenge(now);
        let code = challenge.code.clone();
        let account = Account::new(
            NewAccount {
                name: req.name,
                phone_no: req.phone_no,
                company_name: req.company_name,
                company_email: req.company_email,
                employee_size: req.employee_size,
            },
            challenge,
            now,
        );

        self.store
            .insert_account(&account)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate => {
                    tracing::info!(company_email = %account.company_email, "Registration rejected, email in use");
                    ServiceError::DuplicateAccount
                }
                other => other.into(),
            })?;

        metrics::record_registration();
        tracing::info!(account_id = %account.id, "Account registered");

        tokio::join!(
            self.notifier
                .send_email_challenge(&account.id, &account.company_email, &code),
            self.notifier
                .send_mobile_challenge(&account.id, &account.phone_no),
        );

        Ok(account)
    }

    /// Confirm the email channel. Returns the freshly issued token.
    pub async fn submit_email_code(&self, req: VerifyEmailRequest) -> Result<String, ServiceError> {
        req.validate()?;
        let email = normalize_email(&req.email);
        let code = req.otp.trim().to_lowercase();

        let result: Result<Account, ServiceError> = async {
            let account = self
                .store
                .find_account_by_email(&email)
                .await?
                .ok_or(ServiceError::InvalidOrExpiredCode(Channel::Email))?;

            self.modify(&account.id, |account, now| {
                if !account.email_code_accepts(&code, now) {
                    return Err(ServiceError::InvalidOrExpiredCode(Channel::Email));
                }
                let token = self.sessions.issue(account, now)?;
                account.confirm(Channel::Email, token);
                Ok(())
            })
            .await
        }
        .await;

        self.finish_verification(Channel::Email, result)
    }

    /// Confirm the mobile channel after the provider approves `otp`.
    pub async fn submit_mobile_code(
        &self,
        req: VerifyMobileRequest,
    ) -> Result<String, ServiceError> {
        let req = VerifyMobileRequest {
            phone_no: req.phone_no.trim().to_string(),
            otp: req.otp.trim().to_string(),
        };
        req.validate()?;

        let result: Result<Account, ServiceError> = async {
            match self
                .notifier
                .check_mobile_challenge(&req.phone_no, &req.otp)
                .await
            {
                Ok(MobileCheck::Approved) => {}
                Ok(MobileCheck::Rejected) => {
                    return Err(ServiceError::InvalidOrExpiredCode(Channel::Mobile));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Mobile verification check failed");
                    return Err(ServiceError::InvalidOrExpiredCode(Channel::Mobile));
                }
            }

            let account = self
                .store
                .find_account_by_phone(&req.phone_no)
                .await?
                .ok_or(ServiceError::AccountNotFound)?;

            self.modify(&account.id, |account, now| {
                let token = self.sessions.issue(account, now)?;
                account.confirm(Channel::Mobile, token);
                Ok(())
            })
            .await
        }
        .await;

        self.finish_verification(Channel::Mobile, result)
    }

    /// Replace the email challenge and mail the new code. Says nothing about
    /// whether the account exists.
    pub async fn resend_email_code(&self, req: ResendEmailCodeRequest) -> Result<(), ServiceError> {
        let email = normalize_email(&req.email);
        ResendEmailCodeRequest {
            email: email.clone(),
        }
        .validate()?;

        let Some(account) = self.store.find_account_by_email(&email).await? else {
            tracing::debug!("Email code resend requested for unknown address");
            return Ok(());
        };
        if account.email_verified() {
            return Ok(());
        }

        let updated = self
            .modify(&account.id, |account, now| {
                if !account.email_verified() {
                    account.email_challenge = Some(generate_email_challenge(now));
                }
                Ok(())
            })
            .await?;

        if let Some(challenge) = updated.email_challenge.as_ref() {
            self.notifier
                .send_email_challenge(&updated.id, &updated.company_email, &challenge.code)
                .await;
        }
        Ok(())
    }

    /// Start a new provider challenge for an unverified phone. Same
    /// non-revealing contract as [`Self::resend_email_code`].
    pub async fn resend_mobile_code(
        &self,
        req: ResendMobileCodeRequest,
    ) -> Result<(), ServiceError> {
        let req = ResendMobileCodeRequest {
            phone_no: req.phone_no.trim().to_string(),
        };
        req.validate()?;

        match self.store.find_account_by_phone(&req.phone_no).await? {
            Some(account) if !account.mobile_verified() => {
                self.notifier
                    .send_mobile_challenge(&account.id, &account.phone_no)
                    .await;
            }
            Some(_) => {}
            None => tracing::debug!("Mobile code resend requested for unknown number"),
        }
        Ok(())
    }

    pub async fn authenticate(&self, token: &str) -> Result<Account, ServiceError> {
        self.sessions.authenticate(token, self.clock.now()).await
    }

    /// Versioned read-modify-write of one account.
    async fn modify<F>(&self, account_id: &str, mut apply: F) -> Result<Account, ServiceError>
    where
        F: FnMut(&mut Account, DateTime<Utc>) -> Result<(), ServiceError>,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let now = self.clock.now();
            let mut account = self
                .store
                .find_account_by_id(account_id)
                .await?
                .ok_or(ServiceError::AccountNotFound)?;

            apply(&mut account, now)?;

            let expected = account.touch(now);
            if self
                .store
                .replace_account_if_version(expected, &account)
                .await?
            {
                return Ok(account);
            }
            tracing::debug!(account_id = %account_id, attempt, "Account changed during update, retrying");
        }

        tracing::warn!(account_id = %account_id, "Gave up updating account after repeated conflicts");
        Err(ServiceError::ConcurrentModification)
    }

    fn finish_verification(
        &self,
        channel: Channel,
        result: Result<Account, ServiceError>,
    ) -> Result<String, ServiceError> {
        match result {
            Ok(account) => {
                metrics::record_verification(channel, "approved");
                tracing::info!(
                    account_id = %account.id,
                    channel = %channel,
                    fully_verified = account.fully_verified(),
                    "Channel verified"
                );
                account.session_token.ok_or_else(|| {
                    ServiceError::Internal(anyhow::anyhow!("verified account has no session token"))
                })
            }
            Err(e) => {
                let outcome = match &e {
                    ServiceError::InvalidOrExpiredCode(_) => "rejected",
                    ServiceError::AccountNotFound => "not_found",
                    _ => "error",
                };
                metrics::record_verification(channel, outcome);
                Err(e)
            }
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
