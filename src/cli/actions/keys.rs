use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{model::CodeId, signature};

pub const PRIVATE_KEY_FILE: &str = "client_key.pem";
pub const PUBLIC_KEY_FILE: &str = "client_key.pub.pem";

#[derive(Debug)]
pub struct KeygenArgs {
    pub bits: usize,
    pub out_dir: PathBuf,
}

#[derive(Debug)]
pub struct SignCodeArgs {
    pub code_id: CodeId,
    pub private_key_file: PathBuf,
}

/// Write a fresh client key pair into `out_dir`.
///
/// # Errors
/// Returns an error if generation fails or the files cannot be written.
pub async fn keygen(args: KeygenArgs) -> Result<()> {
    let (private_key, public_key) = write_key_pair(args.bits, &args.out_dir).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "private_key": private_key,
            "public_key": public_key,
        }))?
    );
    Ok(())
}

async fn write_key_pair(bits: usize, out_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let pair = tokio::task::spawn_blocking(move || signature::generate_key_pair(bits))
        .await
        .context("key generation task failed")??;

    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let private_path = out_dir.join(PRIVATE_KEY_FILE);
    let public_path = out_dir.join(PUBLIC_KEY_FILE);

    tokio::fs::write(&private_path, pair.private_key.expose_secret())
        .await
        .with_context(|| format!("failed to write {}", private_path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&private_path, std::fs::Permissions::from_mode(0o600))
            .await
            .with_context(|| format!("failed to restrict {}", private_path.display()))?;
    }
    tokio::fs::write(&public_path, &pair.public_key)
        .await
        .with_context(|| format!("failed to write {}", public_path.display()))?;

    info!(bits, path = %private_path.display(), "key pair written");
    Ok((private_path, public_path))
}

/// Print the base64 signature over a code id.
///
/// # Errors
/// Returns an error if the key cannot be read or used.
pub async fn sign_code(args: SignCodeArgs) -> Result<()> {
    let pem = tokio::fs::read_to_string(&args.private_key_file)
        .await
        .with_context(|| format!("failed to read {}", args.private_key_file.display()))?;
    let signature = signature::sign_code(args.code_id, &SecretString::from(pem))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "code_id": args.code_id,
            "signature": signature,
        }))?
    );
    Ok(())
}
