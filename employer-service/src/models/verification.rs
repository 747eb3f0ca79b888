//! Two-channel verification state.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Channel over which an account proves control of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Mobile,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Mobile => "mobile",
        }
    }

    /// Capitalised name for user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Email => "Email",
            Channel::Mobile => "Mobile",
        }
    }

    fn other(self) -> Self {
        match self {
            Channel::Email => Channel::Mobile,
            Channel::Mobile => Channel::Email,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification progress of an account.
///
/// `Partial` carries the one channel already confirmed. There is no way back
/// out of `Full`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "channel", rename_all = "snake_case")]
pub enum Verification {
    #[default]
    Unverified,
    Partial(Channel),
    Full,
}

impl Verification {
    /// Record a confirmation on `channel`. Confirming a channel twice is a
    /// no-op.
    pub fn confirm(self, channel: Channel) -> Self {
        match self {
            Verification::Unverified => Verification::Partial(channel),
            Verification::Partial(done) if done == channel => self,
            Verification::Partial(done) => {
                debug_assert_eq!(done, channel.other());
                Verification::Full
            }
            Verification::Full => Verification::Full,
        }
    }

    pub fn is_confirmed(&self, channel: Channel) -> bool {
        match self {
            Verification::Unverified => false,
            Verification::Partial(done) => *done == channel,
            Verification::Full => true,
        }
    }

    pub fn email_verified(&self) -> bool {
        self.is_confirmed(Channel::Email)
    }

    pub fn mobile_verified(&self) -> bool {
        self.is_confirmed(Channel::Mobile)
    }

    pub fn fully_verified(&self) -> bool {
        matches!(self, Verification::Full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_orders_reach_full() {
        let a = Verification::Unverified
            .confirm(Channel::Email)
            .confirm(Channel::Mobile);
        let b = Verification::Unverified
            .confirm(Channel::Mobile)
            .confirm(Channel::Email);
        assert_eq!(a, Verification::Full);
        assert_eq!(b, Verification::Full);
    }

    #[test]
    fn repeat_confirmation_is_idempotent() {
        let once = Verification::Unverified.confirm(Channel::Email);
        assert_eq!(once.confirm(Channel::Email), once);
        assert_eq!(Verification::Full.confirm(Channel::Mobile), Verification::Full);
    }

    #[test]
    fn fully_verified_tracks_both_flags() {
        let states = [
            Verification::Unverified,
            Verification::Partial(Channel::Email),
            Verification::Partial(Channel::Mobile),
            Verification::Full,
        ];
        for state in states {
            assert_eq!(
                state.fully_verified(),
                state.email_verified() && state.mobile_verified(),
                "{:?}",
                state
            );
        }
    }

    #[test]
    fn serializes_with_state_tag() {
        let json = serde_json::to_value(Verification::Partial(Channel::Mobile)).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "partial", "channel": "mobile" }));

        let json = serde_json::to_value(Verification::Full).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "full" }));
    }
}
