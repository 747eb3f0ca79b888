//! Account model - one registered employer organization.

use chrono::{DateTime, Duration, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use utoipa::ToSchema;
use uuid::Uuid;

use super::verification::{Channel, Verification};

/// Lifetime of an email challenge code.
pub const EMAIL_CODE_TTL_MINUTES: i64 = 10;

/// Outstanding email one-time code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailChallenge {
    pub code: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub expires_utc: DateTime<Utc>,
}

impl EmailChallenge {
    pub fn new(code: String, issued_utc: DateTime<Utc>) -> Self {
        Self {
            code,
            expires_utc: issued_utc + Duration::minutes(EMAIL_CODE_TTL_MINUTES),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_utc
    }

    /// True when `code` matches and the challenge is still live.
    pub fn accepts(&self, code: &str, now: DateTime<Utc>) -> bool {
        let matches: bool = self.code.as_bytes().ct_eq(code.as_bytes()).into();
        matches && !self.is_expired(now)
    }
}

/// Registered employer. `company_email` is unique across all accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub phone_no: String,
    pub company_name: String,
    pub company_email: String,
    pub employee_size: u32,
    #[serde(default)]
    pub verification: Verification,
    pub email_challenge: Option<EmailChallenge>,
    pub session_token: Option<String>,
    pub version: i64,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_utc: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_utc: DateTime<Utc>,
}

/// Identity fields captured at sign-up.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub phone_no: String,
    pub company_name: String,
    pub company_email: String,
    pub employee_size: u32,
}

impl Account {
    pub fn new(fields: NewAccount, challenge: EmailChallenge, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: fields.name,
            phone_no: fields.phone_no,
            company_name: fields.company_name,
            company_email: fields.company_email,
            employee_size: fields.employee_size,
            verification: Verification::Unverified,
            email_challenge: Some(challenge),
            session_token: None,
            version: 0,
            created_utc: now,
            updated_utc: now,
        }
    }

    pub fn email_verified(&self) -> bool {
        self.verification.email_verified()
    }

    pub fn mobile_verified(&self) -> bool {
        self.verification.mobile_verified()
    }

    pub fn fully_verified(&self) -> bool {
        self.verification.fully_verified()
    }

    pub fn email_code_accepts(&self, code: &str, now: DateTime<Utc>) -> bool {
        self.email_challenge
            .as_ref()
            .is_some_and(|challenge| challenge.accepts(code, now))
    }

    /// Apply a successful verification on `channel` and store the freshly
    /// issued session token. Consumes the email challenge on the email path.
    pub fn confirm(&mut self, channel: Channel, session_token: String) {
        self.verification = self.verification.confirm(channel);
        if channel == Channel::Email {
            self.email_challenge = None;
        }
        self.session_token = Some(session_token);
    }

    /// Bump the version for a compare-and-swap write. Returns the version the
    /// stored document must still have.
    pub fn touch(&mut self, now: DateTime<Utc>) -> i64 {
        let expected = self.version;
        self.version += 1;
        self.updated_utc = now;
        expected
    }

    pub fn sanitized(&self) -> AccountResponse {
        AccountResponse::from(self)
    }
}

/// Account as returned to clients. Never carries the code or the token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    #[schema(example = "Asha Rao")]
    pub name: String,
    #[schema(example = "+911234567890")]
    pub phone_no: String,
    #[schema(example = "Acme Labs")]
    pub company_name: String,
    #[schema(example = "hr@acme.example")]
    pub company_email: String,
    #[schema(example = 50)]
    pub employee_size: u32,
    pub email_verified: bool,
    pub mobile_verified: bool,
    pub fully_verified: bool,
    pub created_utc: DateTime<Utc>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            phone_no: account.phone_no.clone(),
            company_name: account.company_name.clone(),
            company_email: account.company_email.clone(),
            employee_size: account.employee_size,
            email_verified: account.email_verified(),
            mobile_verified: account.mobile_verified(),
            fully_verified: account.fully_verified(),
            created_utc: account.created_utc,
        }
    }
}
