pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::{JwtConfig, RateLimitConfig, SecurityConfig};
use crate::services::providers::{EmailProvider, MobileVerifier};
use crate::services::{
    AccountService, AccountStore, Clock, JobService, JobStore, JwtService, Notifier,
    SessionService,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::metrics::metrics,
        handlers::account::signup,
        handlers::account::verify_email,
        handlers::account::verify_mobile,
        handlers::account::resend_email_code,
        handlers::account::resend_mobile_code,
        handlers::account::get_me,
        handlers::job::create_job,
        handlers::job::list_jobs,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::account::SignupRequest,
            dtos::account::SignupResponse,
            dtos::account::VerifyEmailRequest,
            dtos::account::VerifyMobileRequest,
            dtos::account::VerifyResponse,
            dtos::account::ResendEmailCodeRequest,
            dtos::account::ResendMobileCodeRequest,
            dtos::job::CreateJobRequest,
            dtos::job::CreateJobResponse,
            models::AccountResponse,
            models::JobPostingResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Accounts", description = "Company registration and verification"),
        (name = "Jobs", description = "Job postings and candidate alerts"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Storage, delivery and time sources the services are built on.
pub struct Dependencies {
    pub accounts: Arc<dyn AccountStore>,
    pub jobs: Arc<dyn JobStore>,
    pub email: Arc<dyn EmailProvider>,
    pub mobile: Arc<dyn MobileVerifier>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub jobs: JobService,
    pub store: Arc<dyn AccountStore>,
    pub allowed_origins: Vec<String>,
    pub signup_rate_limiter: IpRateLimiter,
    pub verify_rate_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(
        deps: Dependencies,
        jwt: &JwtConfig,
        security: &SecurityConfig,
        rate_limit: &RateLimitConfig,
    ) -> Self {
        let notifier = Notifier::new(deps.email, deps.mobile);
        let sessions = SessionService::new(deps.accounts.clone(), JwtService::new(jwt));

        let accounts = AccountService::new(
            deps.accounts.clone(),
            notifier.clone(),
            sessions,
            deps.clock.clone(),
        );
        let jobs = JobService::new(deps.jobs, notifier, deps.clock);

        let signup_rate_limiter = create_ip_rate_limiter(
            rate_limit.signup_attempts,
            rate_limit.signup_window_seconds,
        );
        let verify_rate_limiter = create_ip_rate_limiter(
            rate_limit.verify_attempts,
            rate_limit.verify_window_seconds,
        );
        tracing::info!("Rate limiters initialized: Signup, Verify");

        Self {
            accounts,
            jobs,
            store: deps.accounts,
            allowed_origins: security.allowed_origins.clone(),
            signup_rate_limiter,
            verify_rate_limiter,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let signup_route = Router::new()
        .route("/api/users/signup", post(handlers::signup))
        .layer(from_fn_with_state(
            state.signup_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    // Code submission and resend share one budget
    let verify_routes = Router::new()
        .route("/api/users/verify-email", post(handlers::verify_email))
        .route("/api/users/verify-mobile", post(handlers::verify_mobile))
        .route(
            "/api/users/resend-email-code",
            post(handlers::resend_email_code),
        )
        .route(
            "/api/users/resend-mobile-code",
            post(handlers::resend_mobile_code),
        )
        .layer(from_fn_with_state(
            state.verify_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let protected_routes = Router::new()
        .route("/api/users/me", get(handlers::get_me))
        .route(
            "/api/jobs",
            post(handlers::create_job).get(handlers::list_jobs),
        )
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()))
        .merge(signup_route)
        .merge(verify_routes)
        .merge(protected_routes)
        .with_state(state.clone())
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins(&state.allowed_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}

fn allowed_origins(origins: &[String]) -> AllowOrigin {
    if origins.iter().any(|o| o == "*") {
        return AllowOrigin::any();
    }

    let values: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();
    AllowOrigin::list(values)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 500, description = "Store unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
    })?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "service": "employer-service",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
