use url::Url;

use crate::{auth::AuthConfig, cache::CacheConfig};

/// Settings shared by every operation that talks to the cache and the services.
#[derive(Clone, Debug)]
pub struct GlobalArgs {
    pub cache: CacheConfig,
    pub auth: AuthConfig,
    pub user_service_url: Url,
    pub password_service_url: Url,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(
        cache: CacheConfig,
        auth: AuthConfig,
        user_service_url: Url,
        password_service_url: Url,
    ) -> Self {
        Self {
            cache,
            auth,
            user_service_url,
            password_service_url,
        }
    }
}
