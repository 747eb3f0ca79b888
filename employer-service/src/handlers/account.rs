use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        account::{
            ResendEmailCodeRequest, ResendMobileCodeRequest, SignupRequest, SignupResponse,
            VerifyEmailRequest, VerifyMobileRequest, VerifyResponse,
        },
        MessageResponse,
    },
    middleware::AuthAccount,
    models::AccountResponse,
    utils::JsonBody,
    AppState,
};

const RESEND_MESSAGE: &str =
    "If the account exists and is awaiting verification, a new code has been sent.";

/// Register a company account
#[utoipa::path(
    post,
    path = "/api/users/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created, both codes sent", body = SignupResponse),
        (status = 400, description = "Missing or malformed fields", body = crate::dtos::ErrorResponse),
        (status = 409, description = "Email already in use", body = crate::dtos::ErrorResponse),
        (status = 429, description = "Too many requests", body = crate::dtos::ErrorResponse)
    ),
    tag = "Accounts"
)]
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let account = state.accounts.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User registered successfully. Verification email and mobile OTP sent."
                .to_string(),
            account_id: account.id,
        }),
    ))
}

/// Submit the emailed code
#[utoipa::path(
    post,
    path = "/api/users/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified, session token issued", body = VerifyResponse),
        (status = 400, description = "Code invalid or expired", body = crate::dtos::ErrorResponse)
    ),
    tag = "Accounts"
)]
pub async fn verify_email(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<VerifyEmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = state.accounts.submit_email_code(req).await?;

    Ok(Json(VerifyResponse {
        message: "Email verified successfully.".to_string(),
        token,
    }))
}

/// Submit the SMS code
#[utoipa::path(
    post,
    path = "/api/users/verify-mobile",
    request_body = VerifyMobileRequest,
    responses(
        (status = 200, description = "Mobile verified, session token issued", body = VerifyResponse),
        (status = 400, description = "Code invalid or expired", body = crate::dtos::ErrorResponse),
        (status = 404, description = "No account for this number", body = crate::dtos::ErrorResponse)
    ),
    tag = "Accounts"
)]
pub async fn verify_mobile(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<VerifyMobileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = state.accounts.submit_mobile_code(req).await?;

    Ok(Json(VerifyResponse {
        message: "Mobile number verified successfully.".to_string(),
        token,
    }))
}

/// Request a fresh email code
#[utoipa::path(
    post,
    path = "/api/users/resend-email-code",
    request_body = ResendEmailCodeRequest,
    responses(
        (status = 200, description = "Accepted", body = MessageResponse),
        (status = 400, description = "Malformed email", body = crate::dtos::ErrorResponse)
    ),
    tag = "Accounts"
)]
pub async fn resend_email_code(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ResendEmailCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.accounts.resend_email_code(req).await?;
    Ok(Json(MessageResponse {
        message: RESEND_MESSAGE.to_string(),
    }))
}

/// Request a fresh SMS code
#[utoipa::path(
    post,
    path = "/api/users/resend-mobile-code",
    request_body = ResendMobileCodeRequest,
    responses(
        (status = 200, description = "Accepted", body = MessageResponse),
        (status = 400, description = "Malformed phone number", body = crate::dtos::ErrorResponse)
    ),
    tag = "Accounts"
)]
pub async fn resend_mobile_code(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ResendMobileCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.accounts.resend_mobile_code(req).await?;
    Ok(Json(MessageResponse {
        message: RESEND_MESSAGE.to_string(),
    }))
}

/// The calling account
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Accounts"
)]
pub async fn get_me(AuthAccount(account): AuthAccount) -> Json<AccountResponse> {
    Json(account.sanitized())
}
