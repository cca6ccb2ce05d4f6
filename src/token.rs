//! Session and Auth bearer tokens.
//!
//! Both are HS256 JWTs carrying only `{sub, iat}`. They identify a session or a user
//! but grant nothing on their own: authority comes from the matching cache entry still
//! being live, so there is no `exp` claim and none is required on decode.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{
    error::{Error, Result},
    model::{SessionId, UserId},
};

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Session id for Session Tokens, user id for Auth Tokens.
    pub sub: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
}

impl Claims {
    /// # Errors
    ///
    /// `Validation` if the subject is not a session id.
    pub fn session_id(&self) -> Result<SessionId> {
        self.sub.parse()
    }

    /// # Errors
    ///
    /// `Validation` if the subject is not a user id.
    pub fn user_id(&self) -> Result<UserId> {
        self.sub.parse()
    }
}

/// Mint a Session Token for `session_id`, signed with the server session secret.
///
/// # Errors
///
/// `Unknown` if the token cannot be encoded.
pub fn generate_session_token(
    session_id: SessionId,
    secret: &SecretString,
    now: DateTime<Utc>,
) -> Result<String> {
    generate(session_id.to_string(), secret, now)
}

/// Mint an Auth Token for `user_id`. `secret` is the per-session secret from
/// [`SessionId::to_secret`].
///
/// # Errors
///
/// `Unknown` if the token cannot be encoded.
pub fn generate_auth_token(
    user_id: UserId,
    secret: &SecretString,
    now: DateTime<Utc>,
) -> Result<String> {
    generate(user_id.to_string(), secret, now)
}

fn generate(sub: String, secret: &SecretString, now: DateTime<Utc>) -> Result<String> {
    let claims = Claims {
        sub,
        iat: now.timestamp(),
    };
    let token = encode(
        &Header::new(ALGORITHM),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|err| anyhow::anyhow!("failed to encode token: {err}"))?;
    Ok(token)
}

/// Check the signature and algorithm of `token` and return its claims.
///
/// # Errors
///
/// `Validation("token invalid")` for any decode, algorithm or signature failure.
pub fn parse(token: &str, secret: &SecretString) -> Result<Claims> {
    let mut validation = Validation::new(ALGORITHM);
    validation.validate_exp = false;
    validation.required_spec_claims = HashSet::new();

    decode::<Claims>(
        token.trim(),
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| Error::validation("token invalid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn session_token_round_trip() -> Result<()> {
        let now = Utc::now();
        let session_id = SessionId::generate();
        let token = generate_session_token(session_id, &secret("s3cr3t"), now)?;

        let claims = parse(&token, &secret("s3cr3t"))?;
        assert_eq!(claims.session_id()?, session_id);
        assert_eq!(claims.iat, now.timestamp());
        Ok(())
    }

    #[test]
    fn auth_token_uses_the_session_secret() -> Result<()> {
        let server = secret("s3cr3t");
        let session_id = SessionId::generate();
        let user_id = UserId::generate();
        let auth_secret = session_id.to_secret(&server)?;
        let token = generate_auth_token(user_id, &auth_secret, Utc::now())?;

        assert_eq!(parse(&token, &auth_secret)?.user_id()?, user_id);
        assert!(parse(&token, &server).is_err_and(|err| err.is_validation()));
        let other = SessionId::generate().to_secret(&server)?;
        assert!(parse(&token, &other).is_err_and(|err| err.is_validation()));
        Ok(())
    }

    #[test]
    fn rejects_other_algorithms() -> Result<()> {
        let claims = Claims {
            sub: SessionId::generate().to_string(),
            iat: Utc::now().timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(b"s3cr3t"),
        )
        .map_err(|err| anyhow::anyhow!(err))?;

        assert!(parse(&token, &secret("s3cr3t")).is_err_and(|err| err.is_validation()));
        Ok(())
    }

    #[test]
    fn rejects_garbage() {
        for token in ["", "abc", "a.b.c", "eyJhbGciOiJIUzI1NiJ9.e30."] {
            assert!(parse(token, &secret("s3cr3t")).is_err_and(|err| err.is_validation()));
        }
    }

    #[test]
    fn subject_must_be_an_identifier() {
        let claims = Claims {
            sub: String::new(),
            iat: 0,
        };
        assert!(claims.session_id().is_err_and(|err| err.is_validation()));

        let nil = Claims {
            sub: uuid::Uuid::nil().to_string(),
            iat: 0,
        };
        assert!(nil.user_id().is_err_and(|err| err.is_validation()));
    }
}
