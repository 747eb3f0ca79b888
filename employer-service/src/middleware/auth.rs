use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{models::Account, AppState};

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Require a valid session token and attach the caller's account to the
/// request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers()).ok_or_else(|| {
        AppError::AuthError(anyhow::anyhow!("Missing or invalid Authorization header"))
    })?;

    let account = state.accounts.authenticate(&token).await?;

    req.extensions_mut().insert(account);
    Ok(next.run(req).await)
}

/// Extractor for the account resolved by [`auth_middleware`].
pub struct AuthAccount(pub Account);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthAccount
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Account>()
            .cloned()
            .map(AuthAccount)
            .ok_or_else(|| {
                AppError::InternalError(anyhow::anyhow!(
                    "Account missing from request extensions"
                ))
            })
    }
}
