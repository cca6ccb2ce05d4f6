//! Orchestrator configuration and the clock it reads time from.

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::SecretString;

pub const DEFAULT_AUTH_TTL_SECONDS: i64 = 60 * 60;
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;
pub const DEFAULT_CODE_TTL_SECONDS: i64 = 10 * 60;

#[derive(Clone)]
pub struct AuthConfig {
    session_secret: SecretString,
    auth_ttl_seconds: i64,
    session_ttl_seconds: i64,
    code_ttl_seconds: i64,
}

impl AuthConfig {
    /// `session_secret` signs Session Tokens and keys the per-session Auth Token secret.
    #[must_use]
    pub fn new(session_secret: SecretString) -> Self {
        Self {
            session_secret,
            auth_ttl_seconds: DEFAULT_AUTH_TTL_SECONDS,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            code_ttl_seconds: DEFAULT_CODE_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_auth_ttl_seconds(mut self, seconds: i64) -> Self {
        self.auth_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_code_ttl_seconds(mut self, seconds: i64) -> Self {
        self.code_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn auth_ttl_seconds(&self) -> i64 {
        self.auth_ttl_seconds
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn code_ttl_seconds(&self) -> i64 {
        self.code_ttl_seconds
    }

    pub(super) fn session_secret(&self) -> &SecretString {
        &self.session_secret
    }

    pub(super) fn auth_ttl(&self) -> TimeDelta {
        TimeDelta::seconds(self.auth_ttl_seconds)
    }

    pub(super) fn session_ttl(&self) -> TimeDelta {
        TimeDelta::seconds(self.session_ttl_seconds)
    }

    pub(super) fn code_ttl(&self) -> TimeDelta {
        TimeDelta::seconds(self.code_ttl_seconds)
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_secret", &"***")
            .field("auth_ttl_seconds", &self.auth_ttl_seconds)
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("code_ttl_seconds", &self.code_ttl_seconds)
            .finish()
    }
}

/// Source of "now" for issuing entities and checking expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
