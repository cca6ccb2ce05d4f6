//! Map validated CLI matches to an `Action`.

use anyhow::{Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;
use std::path::PathBuf;

use crate::cli::actions::{
    auth::{self as auth_action, Operation, Proof},
    keys::{KeygenArgs, SignCodeArgs},
    Action,
};
use crate::cli::commands::{
    auth, cache, ARG_AUTH_TOKEN, ARG_BITS, ARG_CODE_ID, ARG_EMAIL, ARG_OUT_DIR, ARG_PASSWORD,
    ARG_PRIVATE_KEY_FILE, ARG_PUBLIC_KEY_FILE, ARG_SESSION_TOKEN, ARG_SIGNATURE,
};
use crate::cli::globals::GlobalArgs;
use crate::model::CodeId;

fn string(matches: &ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing required argument: --{name}"))
}

fn path(matches: &ArgMatches, name: &str) -> Result<PathBuf> {
    string(matches, name).map(PathBuf::from)
}

fn code_id(matches: &ArgMatches) -> Result<CodeId> {
    let value = string(matches, ARG_CODE_ID)?;
    value
        .parse()
        .with_context(|| format!("invalid --{ARG_CODE_ID}: {value}"))
}

fn globals(matches: &ArgMatches) -> Result<GlobalArgs> {
    let cache = cache::parse(matches)?;
    let options = auth::Options::parse(matches)?;
    Ok(GlobalArgs::new(
        cache,
        options.config,
        options.user_service_url,
        options.password_service_url,
    ))
}

fn operation(name: &str, sub: &ArgMatches) -> Result<Operation> {
    let operation = match name {
        "sign-up" => Operation::SignUp {
            email: string(sub, ARG_EMAIL)?,
            password: SecretString::from(string(sub, ARG_PASSWORD)?),
        },
        "sign-in" => Operation::SignIn {
            email: string(sub, ARG_EMAIL)?,
            password: SecretString::from(string(sub, ARG_PASSWORD)?),
            public_key_file: path(sub, ARG_PUBLIC_KEY_FILE)?,
        },
        "sign-out" => Operation::SignOut {
            session_token: string(sub, ARG_SESSION_TOKEN)?,
            auth_token: string(sub, ARG_AUTH_TOKEN)?,
        },
        "verify" => Operation::Verify {
            session_token: string(sub, ARG_SESSION_TOKEN)?,
            auth_token: string(sub, ARG_AUTH_TOKEN)?,
        },
        "generate-code" => Operation::GenerateCode {
            session_token: string(sub, ARG_SESSION_TOKEN)?,
        },
        "refresh" => {
            let proof = match sub.get_one::<String>(ARG_SIGNATURE) {
                Some(signature) => Proof::Signature(signature.clone()),
                None => Proof::PrivateKeyFile(path(sub, ARG_PRIVATE_KEY_FILE)?),
            };
            Operation::Refresh {
                session_token: string(sub, ARG_SESSION_TOKEN)?,
                code_id: code_id(sub)?,
                proof,
            }
        }
        "sessions" => Operation::Sessions,
        other => anyhow::bail!("unknown command: {other}"),
    };
    Ok(operation)
}

/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let (name, sub) = matches.subcommand().context("missing command")?;

    match name {
        "keygen" => Ok(Action::Keygen(KeygenArgs {
            bits: sub.get_one::<usize>(ARG_BITS).copied().unwrap_or(2048),
            out_dir: path(sub, ARG_OUT_DIR)?,
        })),
        "sign-code" => Ok(Action::SignCode(SignCodeArgs {
            code_id: code_id(sub)?,
            private_key_file: path(sub, ARG_PRIVATE_KEY_FILE)?,
        })),
        _ => Ok(Action::Auth(auth_action::Args {
            globals: globals(matches)?,
            operation: operation(name, sub)?,
        })),
    }
}
