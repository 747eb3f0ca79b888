//! Job posting model. Postings are immutable once stored.

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(rename = "_id")]
    pub id: String,
    pub job_title: String,
    pub job_description: String,
    pub experience_level: String,
    /// Candidate identifiers as submitted.
    pub candidate: Vec<String>,
    /// Addresses that receive the job alert.
    pub candidate_emails: Vec<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_date: DateTime<Utc>,
    /// Id of the posting account.
    pub posted_by: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_utc: DateTime<Utc>,
}

/// Validated input for a new posting.
#[derive(Debug, Clone)]
pub struct NewJobPosting {
    pub job_title: String,
    pub job_description: String,
    pub experience_level: String,
    pub candidate_emails: Vec<String>,
    pub end_date: DateTime<Utc>,
}

impl JobPosting {
    pub fn new(fields: NewJobPosting, posted_by: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            job_title: fields.job_title,
            job_description: fields.job_description,
            experience_level: fields.experience_level,
            candidate: fields.candidate_emails.clone(),
            candidate_emails: fields.candidate_emails,
            end_date: fields.end_date,
            posted_by,
            created_utc: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobPostingResponse {
    #[schema(example = "9a0b7c1e-5f7f-4b8e-9d0a-2f1b3c4d5e6f")]
    pub id: String,
    #[schema(example = "Backend Engineer")]
    pub job_title: String,
    #[schema(example = "Own our Rust services end to end.")]
    pub job_description: String,
    #[schema(example = "senior")]
    pub experience_level: String,
    pub candidate: Vec<String>,
    pub candidate_emails: Vec<String>,
    pub end_date: DateTime<Utc>,
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub posted_by: String,
    pub created_utc: DateTime<Utc>,
}

impl From<JobPosting> for JobPostingResponse {
    fn from(job: JobPosting) -> Self {
        Self {
            id: job.id,
            job_title: job.job_title,
            job_description: job.job_description,
            experience_level: job.experience_level,
            candidate: job.candidate,
            candidate_emails: job.candidate_emails,
            end_date: job.end_date,
            posted_by: job.posted_by,
            created_utc: job.created_utc,
        }
    }
}
