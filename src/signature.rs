//! RSA-PSS/SHA-256 proof of possession over a refresh code id.
//!
//! The server only ever verifies. `sign_code` and `generate_key_pair` are what a client
//! (or the CLI acting as one) needs to answer a challenge.

use base64ct::{Base64, Encoding};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::pss::{Pss, SigningKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

use crate::{
    error::{Error, Result},
    model::CodeId,
};

/// Salt length used when signing; equals the digest length.
const SALT_LEN: usize = 32;

const DIGEST_LEN: usize = 32;

const INVALID: &str = "signature invalid";

/// Check `signature` (standard base64) as an RSA-PSS signature over the code id string.
///
/// Any salt length the key allows is accepted, from zero up to the maximum some
/// signers default to.
///
/// # Errors
///
/// `Validation("signature invalid")` for every failure: bad base64, unusable key,
/// wrong key, or a signature over a different payload.
pub fn verify(code_id: CodeId, signature: &str, public_key: &str) -> Result<()> {
    let signature = Base64::decode_vec(signature.trim()).map_err(|_| Error::validation(INVALID))?;
    let public_key = decode_public_key(public_key).map_err(|_| Error::validation(INVALID))?;
    let digest = Sha256::digest(code_id.to_string().as_bytes());

    let verified = salt_lengths(&public_key).any(|salt_len| {
        public_key
            .verify(Pss::new_with_salt::<Sha256>(salt_len), &digest, &signature)
            .is_ok()
    });
    if verified {
        Ok(())
    } else {
        Err(Error::validation(INVALID))
    }
}

/// Candidate PSS salt lengths for `key`, `SALT_LEN` first.
fn salt_lengths(key: &RsaPublicKey) -> impl Iterator<Item = usize> {
    let em_len = (key.n().bits().saturating_sub(1)).div_ceil(8);
    let max = em_len.saturating_sub(DIGEST_LEN + 2);
    std::iter::once(SALT_LEN)
        .filter(move |len| *len <= max)
        .chain((0..=max).filter(|len| *len != SALT_LEN))
}

/// Decode a client public key: PEM (SPKI or PKCS#1), or base64 of the DER forms.
///
/// # Errors
///
/// `Validation` if the input is not an RSA public key.
pub fn decode_public_key(public_key: &str) -> Result<RsaPublicKey> {
    let public_key = public_key.trim();
    let invalid = || Error::validation("invalid public key");

    if public_key.starts_with("-----BEGIN") {
        if let Ok(key) = RsaPublicKey::from_public_key_pem(public_key) {
            return Ok(key);
        }
        return RsaPublicKey::from_pkcs1_pem(public_key).map_err(|_| invalid());
    }

    let compact: String = public_key.split_whitespace().collect();
    let der = Base64::decode_vec(&compact).map_err(|_| invalid())?;
    if let Ok(key) = RsaPublicKey::from_public_key_der(&der) {
        return Ok(key);
    }
    RsaPublicKey::from_pkcs1_der(&der).map_err(|_| invalid())
}

fn decode_private_key(private_key: &str) -> Result<RsaPrivateKey> {
    let private_key = private_key.trim();
    if let Ok(key) = RsaPrivateKey::from_pkcs8_pem(private_key) {
        return Ok(key);
    }
    RsaPrivateKey::from_pkcs1_pem(private_key).map_err(|_| Error::validation("invalid private key"))
}

/// Sign a code id with a PEM private key (PKCS#8 or PKCS#1), returning standard base64.
///
/// # Errors
///
/// `Validation` if the key cannot be decoded, `Unknown` if signing fails.
pub fn sign_code(code_id: CodeId, private_key: &SecretString) -> Result<String> {
    let key = decode_private_key(private_key.expose_secret())?;
    let signing_key = SigningKey::<Sha256>::new_with_salt_len(key, SALT_LEN);
    let signature = signing_key
        .try_sign_with_rng(&mut rand::thread_rng(), code_id.to_string().as_bytes())
        .map_err(|err| anyhow::anyhow!("failed to sign code: {err}"))?;
    Ok(Base64::encode_string(&signature.to_bytes()))
}

pub struct KeyPair {
    /// PKCS#8 PEM.
    pub private_key: SecretString,
    /// SPKI PEM, the form sent at sign-in.
    pub public_key: String,
}

/// # Errors
///
/// `Unknown` if generation or PEM encoding fails.
pub fn generate_key_pair(bits: usize) -> Result<KeyPair> {
    let private = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
        .map_err(|err| anyhow::anyhow!("failed to generate key: {err}"))?;
    let public_key = private
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|err| anyhow::anyhow!("failed to encode public key: {err}"))?;
    let private_key = private
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|err| anyhow::anyhow!("failed to encode private key: {err}"))?;

    Ok(KeyPair {
        private_key: SecretString::from((*private_key).clone()),
        public_key,
    })
}
