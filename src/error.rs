//! Error taxonomy shared by every auth transition.
//!
//! - `Validation`: malformed, expired, or mismatched input. The reason is safe to
//!   return to the caller.
//! - `Unauthorized`: authentication or signature failure. Carries no detail.
//! - `NotFound`: the referenced cache entity is absent.
//! - `Unknown`: everything else, including cache and RPC failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn display_messages() {
        assert_eq!(
            Error::validation("code mismatch").to_string(),
            "validation error: code mismatch"
        );
        assert_eq!(Error::Unauthorized.to_string(), "unauthorized");
        assert_eq!(Error::NotFound("code").to_string(), "code not found");
        assert_eq!(
            Error::from(anyhow!("cache down")).to_string(),
            "cache down"
        );
    }

    #[test]
    fn classification_helpers() {
        assert!(Error::validation("x").is_validation());
        assert!(Error::Unauthorized.is_unauthorized());
        assert!(Error::NotFound("auth").is_not_found());
        assert!(!Error::from(anyhow!("boom")).is_not_found());
    }
}
