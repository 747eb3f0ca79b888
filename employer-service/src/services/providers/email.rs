use super::{
    job_alert_body, job_alert_subject, verification_body, verification_subject, EmailProvider,
    ProviderError,
};
use crate::config::SmtpConfig;
use crate::models::{Account, JobPosting};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SmtpEmailProvider {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpEmailProvider {
    pub fn new(config: SmtpConfig) -> Result<Self, ProviderError> {
        if !config.enabled {
            return Ok(Self {
                config,
                transport: None,
            });
        }

        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create SMTP relay: {}", e))
            })?
            .port(config.port)
            .credentials(creds)
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self {
            config,
            transport: Some(transport),
        })
    }

    fn transport(&self) -> Result<&AsyncSmtpTransport<Tokio1Executor>, ProviderError> {
        if !self.config.enabled {
            return Err(ProviderError::NotEnabled(
                "SMTP email provider is not enabled".to_string(),
            ));
        }
        self.transport.as_ref().ok_or_else(|| {
            ProviderError::Configuration("SMTP transport not initialized".to_string())
        })
    }

    async fn send_text(&self, to: &str, subject: &str, body: String) -> Result<(), ProviderError> {
        let transport = self.transport()?;

        let from_mailbox: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| ProviderError::Configuration(format!("Invalid from address: {}", e)))?;

        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| ProviderError::InvalidRecipient(format!("{}: {}", to, e)))?;

        let message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| ProviderError::SendFailed(format!("Failed to build message: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| ProviderError::SendFailed(format!("Failed to send email: {}", e)))?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[async_trait]
impl EmailProvider for SmtpEmailProvider {
    async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), ProviderError> {
        self.send_text(to, verification_subject(), verification_body(code))
            .await
    }

    async fn send_job_alert(
        &self,
        recipients: &[String],
        posting: &JobPosting,
        poster: &Account,
    ) -> Result<(), ProviderError> {
        let subject = job_alert_subject(posting);
        let mut failed = Vec::new();

        for to in recipients {
            if let Err(e) = self
                .send_text(to, &subject, job_alert_body(posting, poster))
                .await
            {
                tracing::warn!(to = %to, error = %e, "Job alert delivery failed");
                failed.push(to.as_str());
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::SendFailed(format!(
                "{} of {} job alerts failed",
                failed.len(),
                recipients.len()
            )))
        }
    }
}

/// A message captured by [`MockEmailProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mock email provider for testing. Records every message it accepts.
pub struct MockEmailProvider {
    enabled: bool,
    failing: AtomicBool,
    sent: Mutex<Vec<SentEmail>>,
}

impl MockEmailProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            failing: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Make every subsequent send fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Most recent verification code mailed to `to`.
    pub fn last_code_for(&self, to: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .rev()
            .find(|m| m.to == to && m.subject == verification_subject())
            .and_then(|m| {
                m.body
                    .strip_prefix("Your verification code is: ")
                    .and_then(|rest| rest.split_whitespace().next())
                    .map(str::to_string)
            })
    }

    fn record(&self, to: &str, subject: String, body: String) -> Result<(), ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotEnabled(
                "Mock email provider is not enabled".to_string(),
            ));
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::SendFailed("mock failure".to_string()));
        }

        tracing::info!(to = %to, subject = %subject, "[MOCK] Email would be sent");
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(SentEmail {
                to: to.to_string(),
                subject,
                body,
            });
        Ok(())
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), ProviderError> {
        self.record(to, verification_subject().to_string(), verification_body(code))
    }

    async fn send_job_alert(
        &self,
        recipients: &[String],
        posting: &JobPosting,
        poster: &Account,
    ) -> Result<(), ProviderError> {
        for to in recipients {
            self.record(to, job_alert_subject(posting), job_alert_body(posting, poster))?;
        }
        Ok(())
    }
}
