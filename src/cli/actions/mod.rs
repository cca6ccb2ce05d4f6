pub mod auth;
pub mod keys;

// Internal "interpreter" for `Action`.
mod run;

#[derive(Debug)]
pub enum Action {
    Auth(auth::Args),
    Keygen(keys::KeygenArgs),
    SignCode(keys::SignCodeArgs),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
