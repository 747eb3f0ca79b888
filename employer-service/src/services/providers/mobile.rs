use super::{MobileCheck, MobileVerifier, ProviderError};
use crate::config::TwilioConfig;
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const TWILIO_VERIFY_URL: &str = "https://verify.twilio.com/v2/Services";
const TWILIO_TIMEOUT: Duration = Duration::from_secs(10);

/// Twilio Verify v2. Twilio generates, delivers and checks the code.
pub struct TwilioVerifyProvider {
    config: TwilioConfig,
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct VerificationResponse {
    sid: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct VerificationCheckResponse {
    status: String,
}

impl TwilioVerifyProvider {
    pub fn new(config: TwilioConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(TWILIO_TIMEOUT)
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            base_url: format!("{}/{}", TWILIO_VERIFY_URL, config.verify_service_sid),
            config,
            client,
        })
    }

    fn ensure_enabled(&self) -> Result<(), ProviderError> {
        if !self.config.enabled {
            return Err(ProviderError::NotEnabled(
                "Twilio Verify provider is not enabled".to_string(),
            ));
        }
        if self.config.account_sid.is_empty() || self.config.verify_service_sid.is_empty() {
            return Err(ProviderError::Configuration(
                "Twilio account SID and Verify service SID are required".to_string(),
            ));
        }
        Ok(())
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(form)
            .send()
            .await
            .map_err(|e| {
                ProviderError::Connection(format!("Failed to connect to Twilio: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::SendFailed(format!(
                "Twilio API returned error status {}: {}",
                status, body
            )));
        }

        response.json().await.map_err(|e| {
            ProviderError::SendFailed(format!("Failed to parse Twilio response: {}", e))
        })
    }
}

#[async_trait]
impl MobileVerifier for TwilioVerifyProvider {
    async fn start_verification(&self, phone: &str) -> Result<String, ProviderError> {
        self.ensure_enabled()?;

        let response: VerificationResponse = self
            .post_form("Verifications", &[("To", phone), ("Channel", "sms")])
            .await?;

        tracing::info!(
            to = %phone,
            status = %response.status,
            "Mobile verification started via Twilio"
        );
        Ok(response.sid)
    }

    async fn check_verification(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<MobileCheck, ProviderError> {
        self.ensure_enabled()?;

        let response: VerificationCheckResponse = self
            .post_form("VerificationCheck", &[("To", phone), ("Code", code)])
            .await?;

        if response.status == "approved" {
            Ok(MobileCheck::Approved)
        } else {
            Ok(MobileCheck::Rejected)
        }
    }
}

/// Mock mobile verifier for testing. Holds one live code per phone number.
pub struct MockMobileVerifier {
    enabled: bool,
    failing: AtomicBool,
    started: AtomicU64,
    codes: Mutex<HashMap<String, String>>,
}

impl MockMobileVerifier {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            failing: AtomicBool::new(false),
            started: AtomicU64::new(0),
            codes: Mutex::new(HashMap::new()),
        }
    }

    /// Make every subsequent call fail as if the provider were down.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn start_count(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }

    /// Live code for `phone`, if a challenge is outstanding.
    pub fn code_for(&self, phone: &str) -> Option<String> {
        self.codes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(phone)
            .cloned()
    }

    fn check_available(&self) -> Result<(), ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotEnabled(
                "Mock mobile verifier is not enabled".to_string(),
            ));
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::Connection("mock failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MobileVerifier for MockMobileVerifier {
    async fn start_verification(&self, phone: &str) -> Result<String, ProviderError> {
        self.check_available()?;

        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        self.codes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(phone.to_string(), code);
        let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::info!(to = %phone, "[MOCK] Mobile verification would be started");
        Ok(format!("mock-verification-{}", n))
    }

    async fn check_verification(
        &self,
        phone: &str,
        code: &str,
    ) -> Result<MobileCheck, ProviderError> {
        self.check_available()?;

        let mut codes = self.codes.lock().unwrap_or_else(|e| e.into_inner());
        match codes.get(phone) {
            Some(live) if live == code => {
                codes.remove(phone);
                Ok(MobileCheck::Approved)
            }
            _ => Ok(MobileCheck::Rejected),
        }
    }
}
