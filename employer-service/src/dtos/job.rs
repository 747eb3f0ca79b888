use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::JobPostingResponse;

/// Candidate addresses, either one comma-separated string or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CandidateList {
    Text(String),
    List(Vec<String>),
}

impl Default for CandidateList {
    fn default() -> Self {
        CandidateList::Text(String::new())
    }
}

impl CandidateList {
    /// Split on commas, trim, and drop empty entries.
    pub fn entries(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            CandidateList::Text(text) => text.split(',').collect(),
            CandidateList::List(items) => items
                .iter()
                .flat_map(|item| item.split(','))
                .collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateJobRequest {
    #[validate(length(min = 1, message = "Job title is required."))]
    #[schema(example = "Backend Engineer")]
    pub job_title: String,

    #[validate(length(min = 1, message = "Job description is required."))]
    #[schema(example = "Own our Rust services end to end.")]
    pub job_description: String,

    #[validate(length(min = 1, message = "Experience level is required."))]
    #[schema(example = "senior")]
    pub experience_level: String,

    #[schema(value_type = String, example = "dev1@example.com, dev2@example.com")]
    pub candidate: CandidateList,

    #[validate(length(min = 1, message = "End date is required."))]
    #[schema(example = "2030-01-31")]
    pub end_date: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateJobResponse {
    #[schema(example = "Job posted successfully! and email alerts sent")]
    pub message: String,
    pub job: JobPostingResponse,
}
