use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

const REQUIRED: &str = "All fields are required.";
const PHONE_FORMAT: &str = "Invalid phone number format. It should be in the format +91XXXXXXXXXX.";

/// `+91` followed by exactly ten digits.
pub fn is_valid_phone(phone: &str) -> bool {
    phone
        .strip_prefix("+91")
        .is_some_and(|rest| rest.len() == 10 && rest.bytes().all(|b| b.is_ascii_digit()))
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let (code, message) = if phone.is_empty() {
        ("required", REQUIRED)
    } else if !is_valid_phone(phone) {
        ("phone_format", PHONE_FORMAT)
    } else {
        return Ok(());
    };
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    Err(err)
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "All fields are required."))]
    #[schema(example = "Asha Rao")]
    pub name: String,

    #[validate(custom(function = "validate_phone"))]
    #[schema(example = "+911234567890")]
    pub phone_no: String,

    #[validate(length(min = 1, message = "All fields are required."))]
    #[schema(example = "Acme Labs")]
    pub company_name: String,

    #[validate(email(message = "Invalid email format."))]
    #[schema(example = "hr@acme.example")]
    pub company_email: String,

    #[validate(range(min = 1, message = "All fields are required."))]
    #[schema(example = 50, minimum = 1)]
    pub employee_size: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    #[schema(example = "User registered successfully. Verification email and mobile OTP sent.")]
    pub message: String,
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub account_id: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct VerifyEmailRequest {
    #[serde(alias = "companyEmail")]
    #[validate(length(min = 1, message = "All fields are required."))]
    #[schema(example = "hr@acme.example")]
    pub email: String,

    #[validate(length(min = 1, message = "All fields are required."))]
    #[schema(example = "a1b2c3")]
    pub otp: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyMobileRequest {
    #[validate(custom(function = "validate_phone"))]
    #[schema(example = "+911234567890")]
    pub phone_no: String,

    #[validate(length(min = 1, message = "All fields are required."))]
    #[schema(example = "123456")]
    pub otp: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyResponse {
    #[schema(example = "Email verified successfully.")]
    pub message: String,
    #[schema(example = "eyJhbGciOiJIUzI1NiJ9...")]
    pub token: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(default)]
pub struct ResendEmailCodeRequest {
    #[serde(alias = "companyEmail")]
    #[validate(email(message = "Invalid email format."))]
    #[schema(example = "hr@acme.example")]
    pub email: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ResendMobileCodeRequest {
    #[validate(custom(function = "validate_phone"))]
    #[schema(example = "+911234567890")]
    pub phone_no: String,
}
