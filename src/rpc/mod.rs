//! Ports for the services that own users and password credentials.
//!
//! The orchestrator only sees these traits; `http` has the JSON-over-HTTP clients and
//! tests use in-memory fakes.

mod http;

pub use self::http::{HttpPasswordService, HttpUserService};

use secrecy::SecretString;

use crate::{cache::BoxFuture, error::Result, model::UserId};

pub trait UserService: Send + Sync {
    /// Mint a new user id.
    fn create(&self) -> BoxFuture<'_, Result<UserId>>;
}

pub trait PasswordService: Send + Sync {
    /// Register credentials for an existing user.
    fn sign_up<'a>(
        &'a self,
        user_id: UserId,
        email: &'a str,
        password: &'a SecretString,
    ) -> BoxFuture<'a, Result<()>>;

    /// Check credentials and return the user they belong to.
    fn sign_in<'a>(
        &'a self,
        email: &'a str,
        password: &'a SecretString,
    ) -> BoxFuture<'a, Result<UserId>>;
}
