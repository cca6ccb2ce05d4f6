use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Serialize;
use serde_json::json;
use std::{path::PathBuf, sync::Arc};
use tracing::debug;

use crate::{
    auth::{
        Authenticator, GenerateCodeInput, RefreshInput, SignInInput, SignOutInput, SignUpInput,
        VerifyInput,
    },
    cache::RedisCache,
    cli::globals::GlobalArgs,
    model::CodeId,
    rpc::{HttpPasswordService, HttpUserService},
    signature,
};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub operation: Operation,
}

/// How the client proves possession of the session key during refresh.
#[derive(Debug)]
pub enum Proof {
    Signature(String),
    PrivateKeyFile(PathBuf),
}

#[derive(Debug)]
pub enum Operation {
    SignUp {
        email: String,
        password: SecretString,
    },
    SignIn {
        email: String,
        password: SecretString,
        public_key_file: PathBuf,
    },
    SignOut {
        session_token: String,
        auth_token: String,
    },
    Verify {
        session_token: String,
        auth_token: String,
    },
    GenerateCode {
        session_token: String,
    },
    Refresh {
        session_token: String,
        code_id: CodeId,
        proof: Proof,
    },
    Sessions,
}

/// Run one auth operation against the configured cache and services and print the
/// result as JSON.
///
/// # Errors
/// Returns an error if the cache is unreachable, an input file cannot be read, or the
/// operation fails.
pub async fn execute(args: Args) -> Result<()> {
    let Args { globals, operation } = args;
    let authenticator = connect(&globals).await?;
    let output = run(&authenticator, operation).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn connect(globals: &GlobalArgs) -> Result<Authenticator> {
    let cache = RedisCache::connect(&globals.cache).await?;
    let users = HttpUserService::new(globals.user_service_url.clone())?;
    let passwords = HttpPasswordService::new(globals.password_service_url.clone())?;
    debug!(cache = %globals.cache, "authenticator ready");

    Ok(Authenticator::new(
        globals.auth.clone(),
        Arc::new(cache),
        Arc::new(users),
        Arc::new(passwords),
    ))
}

fn to_json<T: Serialize>(output: &T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(output)?)
}

pub(crate) async fn run(
    authenticator: &Authenticator,
    operation: Operation,
) -> Result<serde_json::Value> {
    match operation {
        Operation::SignUp { email, password } => {
            let output = authenticator
                .sign_up(SignUpInput { email, password })
                .await?;
            to_json(&output)
        }
        Operation::SignIn {
            email,
            password,
            public_key_file,
        } => {
            let public_key = tokio::fs::read_to_string(&public_key_file)
                .await
                .with_context(|| format!("failed to read {}", public_key_file.display()))?;
            let output = authenticator
                .sign_in(SignInInput {
                    email,
                    password,
                    public_key,
                })
                .await?;
            to_json(&output)
        }
        Operation::SignOut {
            session_token,
            auth_token,
        } => {
            let output = authenticator
                .sign_out(SignOutInput {
                    session_token,
                    auth_token,
                })
                .await?;
            to_json(&output)
        }
        Operation::Verify {
            session_token,
            auth_token,
        } => {
            let output = authenticator
                .verify(VerifyInput {
                    session_token,
                    auth_token,
                })
                .await?;
            to_json(&output)
        }
        Operation::GenerateCode { session_token } => {
            let output = authenticator
                .generate_code(GenerateCodeInput { session_token })
                .await?;
            to_json(&output)
        }
        Operation::Refresh {
            session_token,
            code_id,
            proof,
        } => {
            let signature = resolve_signature(code_id, proof).await?;
            let output = authenticator
                .refresh(RefreshInput {
                    session_token,
                    code_id,
                    signature,
                })
                .await?;
            to_json(&output)
        }
        Operation::Sessions => {
            let session_ids = authenticator.session_ids().await?;
            Ok(json!({ "session_ids": session_ids }))
        }
    }
}

async fn resolve_signature(code_id: CodeId, proof: Proof) -> Result<String> {
    match proof {
        Proof::Signature(signature) => Ok(signature),
        Proof::PrivateKeyFile(path) => {
            let pem = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(signature::sign_code(code_id, &SecretString::from(pem))?)
        }
    }
}
