//! `Code`: the single-use refresh challenge stored per session.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::{expiry, CodeId, SessionId};
use crate::cache::Entity;
use crate::error::{Error, Result};

/// One-time refresh challenge. Stored under its session id, so issuing a new code
/// replaces any code still outstanding for that session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub code_id: CodeId,
    pub session_id: SessionId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Code {
    /// # Errors
    ///
    /// Returns `Validation` if `ttl` is not positive.
    pub fn issue(session_id: SessionId, issued_at: DateTime<Utc>, ttl: TimeDelta) -> Result<Self> {
        Ok(Self {
            code_id: CodeId::generate(),
            session_id,
            issued_at,
            expires_at: expiry("code", issued_at, ttl)?,
        })
    }

    /// Check that this code is the one the client is redeeming and is still live.
    ///
    /// # Errors
    ///
    /// Returns `Validation` on a code id mismatch or once the code has expired.
    pub fn redeemable(&self, code_id: CodeId, now: DateTime<Utc>) -> Result<()> {
        if self.code_id != code_id {
            return Err(Error::validation("code mismatch"));
        }
        if self.is_expired(now) {
            return Err(Error::validation("code expired"));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl Entity for Code {
    const PREFIX: &'static str = "code";
    const NAME: &'static str = "code";

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
    fn code_is_keyed_by_session() {
        let session_id = SessionId::generate();
        let code = Code::issue(session_id, Utc::now(), TimeDelta::minutes(10)).expect("issue code");

        assert_eq!(code.key_id(), session_id.to_string());
        assert_eq!(code.ttl().ok(), Some(std::time::Duration::from_secs(600)));
    }

    #[test]
    fn redeemable_checks_id_then_expiry() {
        let now = Utc::now();
        let code = Code::issue(SessionId::generate(), now, TimeDelta::minutes(10)).expect("issue code");

        assert!(code.redeemable(code.code_id, now).is_ok());

        let mismatch = code.redeemable(CodeId::generate(), now);
        assert!(matches!(mismatch, Err(Error::Validation(reason)) if reason == "code mismatch"));

        let expired = code.redeemable(code.code_id, code.expires_at);
        assert!(matches!(expired, Err(Error::Validation(reason)) if reason == "code expired"));

        // A mismatched id is reported even when the code has also expired.
        let both = code.redeemable(CodeId::generate(), code.expires_at);
        assert!(matches!(both, Err(Error::Validation(reason)) if reason == "code mismatch"));
    }
}
