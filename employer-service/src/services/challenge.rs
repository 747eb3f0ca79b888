//! One-time email codes.

use chrono::{DateTime, Utc};
use rand::RngCore;

use crate::models::EmailChallenge;

/// Random bytes per code; hex encoding doubles this to the code length.
const EMAIL_CODE_BYTES: usize = 3;

/// Fresh email challenge valid for ten minutes from `now`. The code comes
/// from the thread-local CSPRNG and carries no account data.
pub fn generate_email_challenge(now: DateTime<Utc>) -> EmailChallenge {
    let mut bytes = [0u8; EMAIL_CODE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    EmailChallenge::new(hex::encode(bytes), now)
}
