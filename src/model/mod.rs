//! Identifiers and the cached value objects (`Session`, `Auth`, `Code`).
//!
//! Identifiers are random v4 UUIDs. The nil UUID is never a valid identifier, so a
//! token that decodes to it is rejected instead of being treated as an identity.

mod auth;
mod code;
mod session;

pub use auth::Auth;
pub use code::Code;
pub use session::Session;

use anyhow::anyhow;
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

const AUTH_SECRET_CONTEXT: &[u8] = b"keyward.auth-token:";

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "Uuid", into = "Uuid")]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl TryFrom<Uuid> for $name {
            type Error = Error;

            fn try_from(uuid: Uuid) -> Result<Self> {
                if uuid.is_nil() {
                    return Err(Error::validation(concat!("empty ", $label)));
                }
                Ok(Self(uuid))
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let uuid = Uuid::parse_str(s.trim())
                    .map_err(|_| Error::validation(concat!("invalid ", $label)))?;
                Self::try_from(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Identifier minted by the user service.
    UserId,
    "user id"
);
uuid_id!(
    /// Server-generated identifier of a sign-in session.
    SessionId,
    "session id"
);
uuid_id!(
    /// Single-use identifier of a refresh challenge.
    CodeId,
    "code id"
);

impl SessionId {
    /// Derive the secret that signs Auth Tokens issued for this session.
    ///
    /// HMAC-SHA256 of the session id keyed by the server session secret, base64url.
    ///
    /// # Errors
    ///
    /// Returns `Unknown` if the HMAC cannot be keyed.
    pub fn to_secret(&self, server_secret: &SecretString) -> Result<SecretString> {
        let mut mac = HmacSha256::new_from_slice(server_secret.expose_secret().as_bytes())
            .map_err(|err| anyhow!("failed to key auth secret derivation: {err}"))?;
        mac.update(AUTH_SECRET_CONTEXT);
        mac.update(self.to_string().as_bytes());
        let digest = mac.finalize().into_bytes();
        Ok(SecretString::from(Base64UrlUnpadded::encode_string(&digest)))
    }
}

/// `issued_at + ttl`, rejecting empty or out-of-range lifetimes.
fn expiry(entity: &str, issued_at: DateTime<Utc>, ttl: TimeDelta) -> Result<DateTime<Utc>> {
    if ttl <= TimeDelta::zero() {
        return Err(Error::validation(format!(
            "{entity} must expire after it is issued"
        )));
    }
    issued_at
        .checked_add_signed(ttl)
        .ok_or_else(|| Error::validation(format!("{entity} lifetime out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_strings() {
        let id = SessionId::generate();
        let parsed: SessionId = id.to_string().parse().expect("parse session id");
        assert_eq!(parsed, id);
    }

    #[test]
    fn nil_and_garbage_ids_are_rejected() {
        let nil = Uuid::nil().to_string();
        assert!(nil.parse::<UserId>().is_err_and(|err| err.is_validation()));
        assert!("not-a-uuid"
            .parse::<CodeId>()
            .is_err_and(|err| err.is_validation()));
        assert!(UserId::try_from(Uuid::nil()).is_err());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = UserId::generate();
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{id}\""));

        let nil = format!("\"{}\"", Uuid::nil());
        assert!(serde_json::from_str::<UserId>(&nil).is_err());
    }

    #[test]
    fn auth_secret_is_bound_to_session_and_server_secret() {
        let server = SecretString::from("server-secret".to_string());
        let other_server = SecretString::from("other-secret".to_string());
        let first = SessionId::generate();
        let second = SessionId::generate();

        let a = first.to_secret(&server).expect("derive");
        let b = first.to_secret(&server).expect("derive");
        let c = second.to_secret(&server).expect("derive");
        let d = first.to_secret(&other_server).expect("derive");

        assert_eq!(a.expose_secret(), b.expose_secret());
        assert_ne!(a.expose_secret(), c.expose_secret());
        assert_ne!(a.expose_secret(), d.expose_secret());
        assert_ne!(a.expose_secret(), first.to_string());
    }

    #[test]
    fn expiry_rejects_empty_windows() {
        let now = Utc::now();
        assert!(expiry("code", now, TimeDelta::zero()).is_err());
        assert!(expiry("code", now, TimeDelta::seconds(-1)).is_err());
        assert_eq!(
            expiry("code", now, TimeDelta::seconds(1)).ok(),
            Some(now + TimeDelta::seconds(1))
        );
    }
}
