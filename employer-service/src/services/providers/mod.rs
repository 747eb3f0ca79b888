pub mod email;
pub mod mobile;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Account, JobPosting};

pub use email::{MockEmailProvider, SentEmail, SmtpEmailProvider};
pub use mobile::{MockMobileVerifier, TwilioVerifyProvider};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not enabled: {0}")]
    NotEnabled(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Send error: {0}")]
    SendFailed(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

/// Outcome of checking a mobile code with the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobileCheck {
    Approved,
    Rejected,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Deliver a one-time verification code to `to`.
    async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), ProviderError>;

    /// Tell each recipient about a new posting from `poster`.
    async fn send_job_alert(
        &self,
        recipients: &[String],
        posting: &JobPosting,
        poster: &Account,
    ) -> Result<(), ProviderError>;
}

/// Mobile verification where the provider owns code generation and delivery.
#[async_trait]
pub trait MobileVerifier: Send + Sync {
    /// Start a challenge for `phone`. Returns the provider's reference.
    async fn start_verification(&self, phone: &str) -> Result<String, ProviderError>;

    async fn check_verification(&self, phone: &str, code: &str)
        -> Result<MobileCheck, ProviderError>;
}

pub(crate) fn verification_subject() -> &'static str {
    "Verify your company email"
}

pub(crate) fn verification_body(code: &str) -> String {
    format!(
        "Your verification code is: {}\n\nThe code expires in {} minutes.",
        code,
        crate::models::EMAIL_CODE_TTL_MINUTES
    )
}

pub(crate) fn job_alert_subject(posting: &JobPosting) -> String {
    format!("Job Alert: {}", posting.job_title)
}

pub(crate) fn job_alert_body(posting: &JobPosting, poster: &Account) -> String {
    format!(
        "A new job has been posted.\n\n\
         Title: {}\n\
         Description: {}\n\
         Experience Level: {}\n\
         End Date: {}\n\n\
         Posted by: {} ({})",
        posting.job_title,
        posting.job_description,
        posting.experience_level,
        posting.end_date.format("%Y-%m-%d"),
        poster.name,
        poster.company_email,
    )
}
