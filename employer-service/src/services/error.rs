use service_core::error::AppError;
use thiserror::Error;

use crate::models::Channel;
use crate::services::database::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Email is already in use.")]
    DuplicateAccount,

    #[error("{} verification OTP is invalid or has expired.", .0.label())]
    InvalidOrExpiredCode(Channel),

    #[error("User not found.")]
    AccountNotFound,

    #[error("{0}")]
    Unauthorized(String),

    #[error("Account must verify both email and mobile before posting jobs.")]
    NotFullyVerified,

    #[error("Account was modified concurrently, retries exhausted")]
    ConcurrentModification,

    #[error("Database error: {0}")]
    Database(anyhow::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate => ServiceError::DuplicateAccount,
            StoreError::Backend(e) => ServiceError::Database(e),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        messages.dedup();
        ServiceError::Validation(messages.join(" "))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Validation(_) | ServiceError::InvalidOrExpiredCode(_) => {
                AppError::BadRequest(anyhow::anyhow!(message))
            }
            ServiceError::DuplicateAccount => AppError::Conflict(anyhow::anyhow!(message)),
            ServiceError::AccountNotFound => AppError::NotFound(anyhow::anyhow!(message)),
            ServiceError::Unauthorized(_) => AppError::AuthError(anyhow::anyhow!(message)),
            ServiceError::NotFullyVerified => AppError::Forbidden(anyhow::anyhow!(message)),
            ServiceError::ConcurrentModification => {
                AppError::InternalError(anyhow::anyhow!(message))
            }
            ServiceError::Database(e) => AppError::DatabaseError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
