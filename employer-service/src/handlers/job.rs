use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::job::{CreateJobRequest, CreateJobResponse},
    middleware::AuthAccount,
    models::JobPostingResponse,
    utils::JsonBody,
    AppState,
};

/// Post a job and alert its candidates
#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = CreateJobRequest,
    responses(
        (status = 201, description = "Job posted", body = CreateJobResponse),
        (status = 400, description = "Invalid posting", body = crate::dtos::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse),
        (status = 403, description = "Account not fully verified", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Jobs"
)]
pub async fn create_job(
    State(state): State<AppState>,
    AuthAccount(account): AuthAccount,
    JsonBody(req): JsonBody<CreateJobRequest>,
) -> Result<impl IntoResponse, AppError> {
    let job = state.jobs.create_posting(&account, req).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateJobResponse {
            message: "Job posted successfully! and email alerts sent".to_string(),
            job: job.into(),
        }),
    ))
}

/// Postings created by the calling account, newest first
#[utoipa::path(
    get,
    path = "/api/jobs",
    responses(
        (status = 200, description = "Own postings", body = [JobPostingResponse]),
        (status = 401, description = "Missing or invalid token", body = crate::dtos::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Jobs"
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    AuthAccount(account): AuthAccount,
) -> Result<Json<Vec<JobPostingResponse>>, AppError> {
    let jobs = state.jobs.list_postings(&account).await?;
    Ok(Json(jobs.into_iter().map(JobPostingResponse::from).collect()))
}
