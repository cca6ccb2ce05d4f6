//! Plain inputs and outputs of the six auth transitions.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;

use crate::model::{CodeId, UserId};

#[derive(Debug)]
pub struct SignUpInput {
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug, Serialize)]
pub struct SignUpOutput {
    pub user_id: UserId,
}

#[derive(Debug)]
pub struct SignInInput {
    pub email: String,
    pub password: SecretString,
    /// RSA public key the client will sign refresh codes with.
    pub public_key: String,
}

#[derive(Debug, Serialize)]
pub struct SignInOutput {
    pub session_token: String,
    pub auth_token: String,
}

#[derive(Debug)]
pub struct SignOutInput {
    pub session_token: String,
    pub auth_token: String,
}

#[derive(Debug, Default, Serialize)]
pub struct SignOutOutput {}

#[derive(Debug)]
pub struct VerifyInput {
    pub session_token: String,
    pub auth_token: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyOutput {
    pub user_id: UserId,
}

#[derive(Debug)]
pub struct GenerateCodeInput {
    pub session_token: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateCodeOutput {
    pub code_id: CodeId,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct RefreshInput {
    pub session_token: String,
    pub code_id: CodeId,
    /// Standard base64 RSA-PSS signature over `code_id`.
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshOutput {
    pub auth_token: String,
}
