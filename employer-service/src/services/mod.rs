//! Services layer for employer-service.

pub mod accounts;
pub mod challenge;
pub mod clock;
pub mod database;
pub mod error;
pub mod jobs;
mod jwt;
pub mod metrics;
mod notifier;
pub mod providers;
mod session;

pub use accounts::AccountService;
pub use clock::{Clock, MockClock, SystemClock};
pub use database::{AccountStore, InMemoryStore, JobStore, MongoDb, StoreError};
pub use error::ServiceError;
pub use jobs::JobService;
pub use jwt::{JwtService, SessionClaims};
pub use notifier::Notifier;
pub use session::SessionService;
