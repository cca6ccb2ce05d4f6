//! `Session`: a sign-in and the public key its refreshes are checked against.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::{expiry, SessionId, UserId};
use crate::cache::Entity;
use crate::error::Result;

/// Long-lived record binding a user to the public key the client registered at
/// sign-in. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: UserId,
    /// RSA public key, PEM or base64 DER, as supplied by the client.
    pub public_key: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Issue a new session with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `ttl` is not positive.
    pub fn issue(
        user_id: UserId,
        public_key: String,
        issued_at: DateTime<Utc>,
        ttl: TimeDelta,
    ) -> Result<Self> {
        Ok(Self {
            session_id: SessionId::generate(),
            user_id,
            public_key,
            issued_at,
            expires_at: expiry("session", issued_at, ttl)?,
        })
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl Entity for Session {
    const PREFIX: &'static str = "session";
    const NAME: &'static str = "session";

    fn key_id(&self) -> String {
        self.session_id.to_string()
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
    fn issue_sets_window_and_fresh_id() {
        let now = Utc::now();
        let user_id = UserId::generate();
        let first = Session::issue(user_id, "pem".to_string(), now, TimeDelta::days(30))
            .expect("issue session");
        let second = Session::issue(user_id, "pem".to_string(), now, TimeDelta::days(30))
            .expect("issue session");

        assert_eq!(first.expires_at - first.issued_at, TimeDelta::days(30));
        assert_ne!(first.session_id, second.session_id);
        assert_eq!(first.key_id(), first.session_id.to_string());
        assert_eq!(
            first.ttl().ok(),
            Some(std::time::Duration::from_secs(30 * 24 * 60 * 60))
        );
    }

    #[test]
    fn tampered_window_fails_validation() {
        let now = Utc::now();
        let mut session = Session::issue(UserId::generate(), String::new(), now, TimeDelta::hours(1))
            .expect("issue session");
        session.expires_at = session.issued_at;

        assert!(session.validate().is_err_and(|err| err.is_validation()));
        assert!(session.ttl().is_err());
    }

    #[test]
    fn expired_at_and_after_expiry() {
        let now = Utc::now();
        let session = Session::issue(UserId::generate(), String::new(), now, TimeDelta::hours(1))
            .expect("issue session");

        assert!(!session.is_expired(now));
        assert!(!session.is_expired(session.expires_at - TimeDelta::seconds(1)));
        assert!(session.is_expired(session.expires_at));
        assert!(session.is_expired(session.expires_at + TimeDelta::seconds(1)));
    }
}
