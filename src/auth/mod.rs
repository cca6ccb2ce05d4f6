//! Auth orchestrator.
//!
//! State lives entirely in the cache; whether a user is signed in is the presence of
//! its `Session`/`Auth` entries. Each transition reads or writes those entries, minting
//! or parsing tokens on the way:
//!
//! - `sign_up`: user service mints a user id, password service stores credentials.
//! - `sign_in`: credentials checked remotely, then `Session` and `Auth` are written in
//!   one transaction.
//! - `sign_out`: best-effort delete of everything the tokens identify. Never fails.
//! - `verify`: the `Auth` for the token's user must exist and be unexpired.
//! - `generate_code`: one outstanding `Code` per session, last write wins.
//! - `refresh`: redeem a `Code` with a signature from the session's key for a new `Auth`.

mod state;
mod types;
mod utils;


pub use self::state::{
    AuthConfig, Clock, SystemClock, DEFAULT_AUTH_TTL_SECONDS, DEFAULT_CODE_TTL_SECONDS,
    DEFAULT_SESSION_TTL_SECONDS,
};
pub use self::types::{
    GenerateCodeInput, GenerateCodeOutput, RefreshInput, RefreshOutput, SignInInput,
    SignInOutput, SignOutInput, SignOutOutput, SignUpInput, SignUpOutput, VerifyInput,
    VerifyOutput,
};

use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    cache::{CacheBackend, Store, Transaction},
    error::{Error, Result},
    model::{Auth, Code, Session, SessionId, UserId},
    rpc::{PasswordService, UserService},
    signature, token,
};

pub struct Authenticator {
    config: AuthConfig,
    clock: Arc<dyn Clock>,
    users: Arc<dyn UserService>,
    passwords: Arc<dyn PasswordService>,
    sessions: Store<Session>,
    auths: Store<Auth>,
    codes: Store<Code>,
    tx: Transaction,
}

impl Authenticator {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        backend: Arc<dyn CacheBackend>,
        users: Arc<dyn UserService>,
        passwords: Arc<dyn PasswordService>,
    ) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            users,
            passwords,
            sessions: Store::new(Arc::clone(&backend)),
            auths: Store::new(Arc::clone(&backend)),
            codes: Store::new(Arc::clone(&backend)),
            tx: Transaction::new(backend),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Register a new user. Nothing is cached, so a failure in either call leaves no
    /// local state behind.
    ///
    /// # Errors
    ///
    /// `Validation` for a malformed email or empty password, otherwise whatever the
    /// user or password service returns.
    #[instrument(skip(self, input))]
    pub async fn sign_up(&self, input: SignUpInput) -> Result<SignUpOutput> {
        let email = utils::credentials(&input.email, &input.password)?;

        let user_id = self.users.create().await?;
        self.passwords
            .sign_up(user_id, &email, &input.password)
            .await?;

        info!(%user_id, "user signed up");
        Ok(SignUpOutput { user_id })
    }

    /// Check credentials and open a session bound to `public_key`.
    ///
    /// # Errors
    ///
    /// `Validation` for malformed input (including a key that is not RSA), the
    /// password service's error on bad credentials, `Unknown` if the commit fails.
    #[instrument(skip(self, input))]
    pub async fn sign_in(&self, input: SignInInput) -> Result<SignInOutput> {
        let email = utils::credentials(&input.email, &input.password)?;
        signature::decode_public_key(&input.public_key)?;

        let user_id = self.passwords.sign_in(&email, &input.password).await?;

        let now = self.clock.now();
        let session = Session::issue(user_id, input.public_key, now, self.config.session_ttl())?;
        let auth = Auth::issue(user_id, now, self.config.auth_ttl())?;

        self.tx
            .commit(
                vec![
                    self.sessions.create_set_cmd(&session)?,
                    self.auths.create_set_cmd(&auth)?,
                ],
                Vec::new(),
            )
            .await?;

        let secret = self.config.session_secret();
        let session_token = token::generate_session_token(session.session_id, secret, now)?;
        let auth_token =
            token::generate_auth_token(user_id, &session.session_id.to_secret(secret)?, now)?;

        info!(%user_id, session_id = %session.session_id, "user signed in");
        Ok(SignInOutput {
            session_token,
            auth_token,
        })
    }

    /// Delete the session, its outstanding code, and the user's auth. Failures are
    /// logged and dropped.
    ///
    /// # Errors
    ///
    /// Never; the `Result` keeps the signature uniform with the other transitions.
    #[instrument(skip(self, input))]
    pub async fn sign_out(&self, input: SignOutInput) -> Result<SignOutOutput> {
        let session_id = match self.session_id(&input.session_token) {
            Ok(session_id) => session_id,
            Err(err) => {
                warn!("sign-out with unusable session token: {err}");
                return Ok(SignOutOutput::default());
            }
        };
        let id = session_id.to_string();

        if let Err(err) = self.sessions.del(&id).await {
            error!(%session_id, "failed to delete session: {err}");
        }
        if let Err(err) = self.codes.del(&id).await {
            error!(%session_id, "failed to delete code: {err}");
        }

        match self.user_id(session_id, &input.auth_token) {
            Ok(user_id) => {
                if let Err(err) = self.auths.del(&user_id.to_string()).await {
                    error!(%user_id, "failed to delete auth: {err}");
                }
            }
            Err(err) => warn!(%session_id, "sign-out with unusable auth token: {err}"),
        }

        debug!(%session_id, "signed out");
        Ok(SignOutOutput::default())
    }

    /// # Errors
    ///
    /// `Validation` for bad tokens or an expired `Auth`, `Unauthorized` if no `Auth`
    /// exists for the user.
    #[instrument(skip(self, input))]
    pub async fn verify(&self, input: VerifyInput) -> Result<VerifyOutput> {
        let session_id = self.session_id(&input.session_token)?;
        let user_id = self.user_id(session_id, &input.auth_token)?;

        let auth = match self.auths.get(&user_id.to_string()).await {
            Ok(auth) => auth,
            Err(Error::NotFound(_)) => {
                warn!(%user_id, "verify without a live auth");
                return Err(Error::Unauthorized);
            }
            Err(err) => return Err(err),
        };

        if auth.is_expired(self.clock.now()) {
            warn!(%user_id, "verify with an expired auth");
            return Err(Error::validation("auth expired"));
        }

        Ok(VerifyOutput { user_id })
    }

    /// Issue a fresh refresh challenge for the session, replacing any outstanding one.
    ///
    /// # Errors
    ///
    /// `Validation` for a bad session token, `Unknown` if the write fails.
    #[instrument(skip(self, input))]
    pub async fn generate_code(&self, input: GenerateCodeInput) -> Result<GenerateCodeOutput> {
        let session_id = self.session_id(&input.session_token)?;

        let code = Code::issue(session_id, self.clock.now(), self.config.code_ttl())?;
        self.codes.set(&code).await?;

        debug!(%session_id, code_id = %code.code_id, "code issued");
        Ok(GenerateCodeOutput {
            code_id: code.code_id,
            expires_at: code.expires_at,
        })
    }

    /// Exchange a code and a signature over it for a new Auth Token.
    ///
    /// Checks run in order and stop at the first failure: code present (`NotFound`),
    /// code id matches and code unexpired (`Validation`), session present and
    /// unexpired, signature valid under the session key (`Unauthorized`). The code is
    /// deleted in the same commit that writes the new `Auth`; a failed attempt leaves
    /// it in place.
    ///
    /// # Errors
    ///
    /// See above; `Unknown` if a cache call fails.
    #[instrument(skip(self, input), fields(code_id = %input.code_id))]
    pub async fn refresh(&self, input: RefreshInput) -> Result<RefreshOutput> {
        let session_id = self.session_id(&input.session_token)?;
        let id = session_id.to_string();
        let now = self.clock.now();

        let code = self.codes.get(&id).await?;
        code.redeemable(input.code_id, now)?;

        let session = self.sessions.get(&id).await?;
        if session.is_expired(now) {
            return Err(Error::validation("session expired"));
        }

        if let Err(err) = signature::verify(input.code_id, &input.signature, &session.public_key) {
            warn!(%session_id, "refresh rejected: {err}");
            return Err(Error::Unauthorized);
        }

        let auth = Auth::issue(session.user_id, now, self.config.auth_ttl())?;
        self.tx
            .commit(
                vec![self.auths.create_set_cmd(&auth)?],
                vec![self.codes.create_del_cmd(&id)],
            )
            .await?;

        let secret = session_id.to_secret(self.config.session_secret())?;
        let auth_token = token::generate_auth_token(session.user_id, &secret, now)?;

        info!(%session_id, user_id = %session.user_id, "auth refreshed");
        Ok(RefreshOutput { auth_token })
    }

    /// Ids of every live session.
    ///
    /// # Errors
    ///
    /// `Unknown` if the key listing fails.
    #[instrument(skip(self))]
    pub async fn session_ids(&self) -> Result<Vec<SessionId>> {
        let keys = self.sessions.keys(false).await?;
        Ok(keys
            .into_iter()
            .filter_map(|key| match key.parse() {
                Ok(session_id) => Some(session_id),
                Err(err) => {
                    warn!(%key, "skipping session key: {err}");
                    None
                }
            })
            .collect())
    }

    fn session_id(&self, session_token: &str) -> Result<SessionId> {
        token::parse(session_token, self.config.session_secret())?.session_id()
    }

    /// The Auth Token only verifies under the secret derived from its own session.
    fn user_id(&self, session_id: SessionId, auth_token: &str) -> Result<UserId> {
        let secret = session_id.to_secret(self.config.session_secret())?;
        token::parse(auth_token, &secret)?.user_id()
    }
}
