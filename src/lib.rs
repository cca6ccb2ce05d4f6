//! # Keyward (challenge-response sessions)
//!
//! `keyward` signs users in with a password once and keeps them authorized with a
//! key pair afterwards.
//!
//! ## Credentials
//!
//! - **Session** (30 days): created at sign-in, binds the user to an RSA public key
//!   supplied by the client.
//! - **Auth** (1 hour): the user currently holds a valid authorization.
//! - **Code** (10 minutes): single-use refresh challenge, at most one per session.
//!
//! All three live only in the cache (Redis in production), namespaced as
//! `<entity>:<id>`, and expire through the cache's own TTLs.
//!
//! ## Tokens
//!
//! The client holds two HS256 tokens that carry identity only. The **Session Token**
//! is signed with the server session secret. The **Auth Token** is signed with a
//! secret derived from the session id and the server secret, so it is only valid
//! alongside the Session Token that produced it.
//!
//! ## Refresh
//!
//! To renew an expiring Auth without a password the client asks for a Code, signs the
//! code id with its private key (RSA-PSS, SHA-256) and redeems it. A Code is deleted
//! by the refresh that succeeds with it.

pub mod auth;
pub mod cache;
pub mod cli;
pub mod error;
pub mod model;
pub mod rpc;
pub mod signature;
pub mod token;

pub use self::error::{Error, Result};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
