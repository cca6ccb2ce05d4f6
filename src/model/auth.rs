//! `Auth`: the per-user record behind an Auth Token.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::{expiry, UserId};
use crate::cache::Entity;
use crate::error::Result;

/// Short-lived assertion that a user currently holds authorization.
///
/// Keyed by user id, so there is at most one live `Auth` per user and the last
/// write wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    pub auth_id: UserId,
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Auth {
    /// # Errors
    ///
    /// Returns `Validation` if `ttl` is not positive.
    pub fn issue(user_id: UserId, issued_at: DateTime<Utc>, ttl: TimeDelta) -> Result<Self> {
        Ok(Self {
            auth_id: user_id,
            user_id,
            issued_at,
            expires_at: expiry("auth", issued_at, ttl)?,
        })
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl Entity for Auth {
    const PREFIX: &'static str = "auth";
    const NAME: &'static str = "auth";

    fn key_id(&self) -> String {
        self.auth_id.to_string()
    }

    fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_is_keyed_by_user() {
        let user_id = UserId::generate();
        let auth = Auth::issue(user_id, Utc::now(), TimeDelta::hours(1)).expect("issue auth");

        assert_eq!(auth.auth_id, user_id);
        assert_eq!(auth.key_id(), user_id.to_string());
        assert_eq!(auth.ttl().ok(), Some(std::time::Duration::from_secs(3600)));
    }

    #[test]
    fn rejects_non_positive_ttl() {
        let result = Auth::issue(UserId::generate(), Utc::now(), TimeDelta::zero());
        assert!(result.is_err_and(|err| err.is_validation()));
    }
}
