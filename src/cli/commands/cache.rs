use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

use crate::cache::CacheConfig;

pub const ARG_CACHE_URL: &str = "cache-url";

pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_CACHE_URL)
            .long(ARG_CACHE_URL)
            .help("Cache location: redis://[user:pass@]host[:port][/db], rediss://..., or a bare host[:port]")
            .env("KEYWARD_CACHE_URL")
            .default_value("redis://127.0.0.1:6379")
            .global(true),
    )
}

/// # Errors
/// Returns an error if the cache location cannot be parsed.
pub fn parse(matches: &ArgMatches) -> Result<CacheConfig> {
    let value = matches
        .get_one::<String>(ARG_CACHE_URL)
        .context("missing required argument: --cache-url")?;
    CacheConfig::parse(value).context("invalid KEYWARD_CACHE_URL")
}
