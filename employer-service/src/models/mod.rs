pub mod account;
pub mod job_posting;
pub mod verification;

pub use account::{Account, AccountResponse, EmailChallenge, NewAccount, EMAIL_CODE_TTL_MINUTES};
pub use job_posting::{JobPosting, JobPostingResponse, NewJobPosting};
pub use verification::{Channel, Verification};
