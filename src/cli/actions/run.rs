use super::{auth, keys, Action};
use anyhow::Result;

pub(super) async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Auth(args) => auth::execute(args).await,
        Action::Keygen(args) => keys::keygen(args).await,
        Action::SignCode(args) => keys::sign_code(args).await,
    }
}
