use std::sync::Arc;

use super::metrics;
use super::providers::{EmailProvider, MobileCheck, MobileVerifier, ProviderError};
use crate::models::{Account, JobPosting};

/// Outbound delivery on behalf of the domain services.
///
/// Sends are best effort: failures are logged and counted, never returned.
/// Only the mobile check reports provider errors, since its answer decides
/// a verification.
#[derive(Clone)]
pub struct Notifier {
    email: Arc<dyn EmailProvider>,
    mobile: Arc<dyn MobileVerifier>,
}

impl Notifier {
    pub fn new(email: Arc<dyn EmailProvider>, mobile: Arc<dyn MobileVerifier>) -> Self {
        Self { email, mobile }
    }

    pub async fn send_email_challenge(&self, account_id: &str, to: &str, code: &str) {
        match self.email.send_verification_code(to, code).await {
            Ok(()) => metrics::record_notification("email_code", "sent"),
            Err(e) => {
                tracing::error!(account_id = %account_id, error = %e, "Failed to send email verification code");
                metrics::record_notification("email_code", "failed");
            }
        }
    }

    pub async fn send_mobile_challenge(&self, account_id: &str, phone: &str) {
        match self.mobile.start_verification(phone).await {
            Ok(reference) => {
                tracing::debug!(account_id = %account_id, reference = %reference, "Mobile challenge started");
                metrics::record_notification("mobile_code", "sent");
            }
            Err(e) => {
                tracing::error!(account_id = %account_id, error = %e, "Failed to start mobile verification");
                metrics::record_notification("mobile_code", "failed");
            }
        }
    }

    pub async fn check_mobile_challenge(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<MobileCheck, ProviderError> {
        self.mobile.check_verification(phone, code).await
    }

    pub async fn notify_candidates(&self, posting: &JobPosting, poster: &Account) {
        if posting.candidate_emails.is_empty() {
            return;
        }

        match self
            .email
            .send_job_alert(&posting.candidate_emails, posting, poster)
            .await
        {
            Ok(()) => {
                tracing::info!(
                    job_id = %posting.id,
                    recipients = posting.candidate_emails.len(),
                    "Job alert sent"
                );
                metrics::record_notification("job_alert", "sent");
            }
            Err(e) => {
                tracing::error!(job_id = %posting.id, error = %e, "Failed to send job alert");
                metrics::record_notification("job_alert", "failed");
            }
        }
    }
}
