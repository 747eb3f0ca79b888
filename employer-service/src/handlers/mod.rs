pub mod account;
pub mod job;
pub mod metrics;

pub use account::{get_me, resend_email_code, resend_mobile_code, signup, verify_email, verify_mobile};
pub use job::{create_job, list_jobs};
