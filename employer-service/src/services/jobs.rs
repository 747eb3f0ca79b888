use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use validator::{Validate, ValidateEmail};

use super::clock::Clock;
use super::database::JobStore;
use super::error::ServiceError;
use super::metrics;
use super::notifier::Notifier;
use crate::dtos::job::{CandidateList, CreateJobRequest};
use crate::models::{Account, JobPosting, NewJobPosting};

#[derive(Clone)]
pub struct JobService {
    jobs: Arc<dyn JobStore>,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
}

impl JobService {
    pub fn new(jobs: Arc<dyn JobStore>, notifier: Notifier, clock: Arc<dyn Clock>) -> Self {
        Self {
            jobs,
            notifier,
            clock,
        }
    }

    /// Store a posting by `principal` and alert its candidates. Only fully
    /// verified accounts may post.
    pub async fn create_posting(
        &self,
        principal: &Account,
        req: CreateJobRequest,
    ) -> Result<JobPosting, ServiceError> {
        if !principal.fully_verified() {
            tracing::info!(account_id = %principal.id, "Posting refused, account not fully verified");
            return Err(ServiceError::NotFullyVerified);
        }

        let req = CreateJobRequest {
            job_title: req.job_title.trim().to_string(),
            job_description: req.job_description.trim().to_string(),
            experience_level: req.experience_level.trim().to_string(),
            candidate: req.candidate,
            end_date: req.end_date.trim().to_string(),
        };
        req.validate()?;

        let end_date = parse_end_date(&req.end_date)?;
        let candidate_emails = normalize_candidates(&req.candidate)?;

        let job = JobPosting::new(
            NewJobPosting {
                job_title: req.job_title,
                job_description: req.job_description,
                experience_level: req.experience_level,
                candidate_emails,
                end_date,
            },
            principal.id.clone(),
            self.clock.now(),
        );

        self.jobs.insert_job(&job).await?;
        metrics::record_job_posting();
        tracing::info!(
            account_id = %principal.id,
            job_id = %job.id,
            candidates = job.candidate_emails.len(),
            "Job posted"
        );

        self.notifier.notify_candidates(&job, principal).await;
        Ok(job)
    }

    /// The principal's own postings, newest first.
    pub async fn list_postings(&self, principal: &Account) -> Result<Vec<JobPosting>, ServiceError> {
        Ok(self.jobs.list_jobs_by_account(&principal.id).await?)
    }
}

/// RFC 3339 timestamp, or a plain date taken as midnight UTC.
pub fn parse_end_date(raw: &str) -> Result<DateTime<Utc>, ServiceError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| {
            ServiceError::Validation(
                "End date must be a YYYY-MM-DD date or an RFC 3339 timestamp.".to_string(),
            )
        })
}

/// Trimmed, non-empty candidate addresses. Rejects the whole list on the
/// first malformed entry.
pub fn normalize_candidates(list: &CandidateList) -> Result<Vec<String>, ServiceError> {
    let entries = list.entries();
    if let Some(bad) = entries.iter().find(|e| !e.validate_email()) {
        return Err(ServiceError::Validation(format!(
            "Invalid candidate email: {}",
            bad
        )));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn end_date_accepts_date_and_timestamp() {
        assert_eq!(
            parse_end_date("2030-01-31").unwrap(),
            Utc.with_ymd_and_hms(2030, 1, 31, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_end_date("2030-01-31T12:30:00+05:30").unwrap(),
            Utc.with_ymd_and_hms(2030, 1, 31, 7, 0, 0).unwrap()
        );
        assert!(parse_end_date("31/01/2030").is_err());
        assert!(parse_end_date("").is_err());
    }

    #[test]
    fn candidates_must_be_emails() {
        let ok = CandidateList::Text("a@x.example, b@x.example".to_string());
        assert_eq!(
            normalize_candidates(&ok).unwrap(),
            vec!["a@x.example", "b@x.example"]
        );

        let bad = CandidateList::Text("a@x.example, not-an-email".to_string());
        match normalize_candidates(&bad) {
            Err(ServiceError::Validation(msg)) => assert!(msg.contains("not-an-email")),
            other => panic!("expected validation error, got {:?}", other),
        }

        let empty = CandidateList::Text(" , ".to_string());
        assert!(normalize_candidates(&empty).unwrap().is_empty());
    }
}
