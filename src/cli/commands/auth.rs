use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use url::Url;

use crate::auth::AuthConfig;

pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_USER_SERVICE_URL: &str = "user-service-url";
pub const ARG_PASSWORD_SERVICE_URL: &str = "password-service-url";
pub const ARG_AUTH_TTL: &str = "auth-ttl";
pub const ARG_SESSION_TTL: &str = "session-ttl";
pub const ARG_CODE_TTL: &str = "code-ttl";

pub fn with_args(command: Command) -> Command {
    let command = with_secret_args(command);
    let command = with_service_args(command);
    with_ttl_args(command)
}

fn with_secret_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_SESSION_SECRET)
            .long(ARG_SESSION_SECRET)
            .help("Server secret that signs Session Tokens and keys Auth Token secrets")
            .env("KEYWARD_SESSION_SECRET")
            .hide_env_values(true)
            .global(true),
    )
}

fn with_service_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_USER_SERVICE_URL)
                .long(ARG_USER_SERVICE_URL)
                .help("Base URL of the user service")
                .env("KEYWARD_USER_SERVICE_URL")
                .default_value("http://127.0.0.1:8081")
                .global(true),
        )
        .arg(
            Arg::new(ARG_PASSWORD_SERVICE_URL)
                .long(ARG_PASSWORD_SERVICE_URL)
                .help("Base URL of the password credential service")
                .env("KEYWARD_PASSWORD_SERVICE_URL")
                .default_value("http://127.0.0.1:8082")
                .global(true),
        )
}

fn with_ttl_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_AUTH_TTL)
                .long(ARG_AUTH_TTL)
                .help("Auth TTL in seconds")
                .env("KEYWARD_AUTH_TTL")
                .default_value("3600")
                .global(true)
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL)
                .long(ARG_SESSION_TTL)
                .help("Session TTL in seconds")
                .env("KEYWARD_SESSION_TTL")
                .default_value("2592000")
                .global(true)
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_CODE_TTL)
                .long(ARG_CODE_TTL)
                .help("Refresh code TTL in seconds")
                .env("KEYWARD_CODE_TTL")
                .default_value("600")
                .global(true)
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub config: AuthConfig,
    pub user_service_url: Url,
    pub password_service_url: Url,
}

impl Options {
    /// # Errors
    /// Returns an error if the session secret is missing or a service URL is invalid.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let secret = matches
            .get_one::<String>(ARG_SESSION_SECRET)
            .filter(|secret| !secret.is_empty())
            .cloned()
            .context("missing required argument: --session-secret")?;

        let ttl = |name: &str| matches.get_one::<i64>(name).copied();
        let mut config = AuthConfig::new(SecretString::from(secret));
        if let Some(seconds) = ttl(ARG_AUTH_TTL) {
            config = config.with_auth_ttl_seconds(seconds);
        }
        if let Some(seconds) = ttl(ARG_SESSION_TTL) {
            config = config.with_session_ttl_seconds(seconds);
        }
        if let Some(seconds) = ttl(ARG_CODE_TTL) {
            config = config.with_code_ttl_seconds(seconds);
        }

        Ok(Self {
            config,
            user_service_url: url(matches, ARG_USER_SERVICE_URL)?,
            password_service_url: url(matches, ARG_PASSWORD_SERVICE_URL)?,
        })
    }
}

fn url(matches: &ArgMatches, name: &str) -> Result<Url> {
    let value = matches
        .get_one::<String>(name)
        .with_context(|| format!("missing required argument: --{name}"))?;
    Url::parse(value).with_context(|| format!("invalid --{name}: {value}"))
}
