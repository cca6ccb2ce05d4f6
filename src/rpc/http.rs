use anyhow::{anyhow, Context};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::{PasswordService, UserService};
use crate::{
    cache::BoxFuture,
    error::{Error, Result},
    model::UserId,
    APP_USER_AGENT,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct UserIdResponse {
    user_id: UserId,
}

fn client() -> Result<Client> {
    let client = Client::builder()
        .user_agent(APP_USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;
    Ok(client)
}

fn endpoint(base: &Url, path: &str) -> Result<Url> {
    let url = format!("{}{path}", base.as_str().trim_end_matches('/'));
    let url = Url::parse(&url).with_context(|| format!("invalid endpoint URL: {url}"))?;
    Ok(url)
}

/// Map a non-success response onto the error taxonomy. Only validation failures keep
/// the remote message.
async fn status_error(response: Response, entity: &'static str) -> Error {
    let status = response.status();
    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();

    match status {
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            Error::validation(remote_message(&body).unwrap_or_else(|| status.to_string()))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Unauthorized,
        StatusCode::NOT_FOUND => Error::NotFound(entity),
        _ => Error::Unknown(anyhow!("{url} - {status}, {body}")),
    }
}

fn remote_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

async fn user_id(response: Response, entity: &'static str) -> Result<UserId> {
    if !response.status().is_success() {
        return Err(status_error(response, entity).await);
    }
    let body: UserIdResponse = response
        .json()
        .await
        .context("Error parsing JSON response: no user_id found")?;
    Ok(body.user_id)
}

/// `POST {base}/v1/users`.
#[derive(Clone, Debug)]
pub struct HttpUserService {
    client: Client,
    base: Url,
}

impl HttpUserService {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base: Url) -> Result<Self> {
        Ok(Self {
            client: client()?,
            base,
        })
    }

    #[instrument(skip(self), fields(base = %self.base))]
    async fn create_user(&self) -> Result<UserId> {
        let url = endpoint(&self.base, "/v1/users")?;
        let response = self
            .client
            .post(url.as_str())
            .json(&json!({}))
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let user_id = user_id(response, "user").await?;
        debug!(%user_id, "user created");
        Ok(user_id)
    }
}

impl UserService for HttpUserService {
    fn create(&self) -> BoxFuture<'_, Result<UserId>> {
        Box::pin(self.create_user())
    }
}

/// `POST {base}/v1/credentials` and `POST {base}/v1/credentials/sign-in`.
#[derive(Clone, Debug)]
pub struct HttpPasswordService {
    client: Client,
    base: Url,
}

impl HttpPasswordService {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base: Url) -> Result<Self> {
        Ok(Self {
            client: client()?,
            base,
        })
    }

    #[instrument(skip(self, password), fields(base = %self.base))]
    async fn register(&self, user_id: UserId, email: &str, password: &SecretString) -> Result<()> {
        let url = endpoint(&self.base, "/v1/credentials")?;
        let response = self
            .client
            .post(url.as_str())
            .json(&json!({
                "user_id": user_id,
                "email": email,
                "password": password.expose_secret(),
            }))
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        if !response.status().is_success() {
            return Err(status_error(response, "user").await);
        }
        Ok(())
    }

    #[instrument(skip(self, password), fields(base = %self.base))]
    async fn authenticate(&self, email: &str, password: &SecretString) -> Result<UserId> {
        let url = endpoint(&self.base, "/v1/credentials/sign-in")?;
        let response = self
            .client
            .post(url.as_str())
            .json(&json!({
                "email": email,
                "password": password.expose_secret(),
            }))
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        user_id(response, "credential").await
    }
}

impl PasswordService for HttpPasswordService {
    fn sign_up<'a>(
        &'a self,
        user_id: UserId,
        email: &'a str,
        password: &'a SecretString,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.register(user_id, email, password))
    }

    fn sign_in<'a>(
        &'a self,
        email: &'a str,
        password: &'a SecretString,
    ) -> BoxFuture<'a, Result<UserId>> {
        Box::pin(self.authenticate(email, password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn password() -> SecretString {
        SecretString::from("hunter2".to_string())
    }

    async fn services(server: &MockServer) -> anyhow::Result<(HttpUserService, HttpPasswordService)> {
        let base = Url::parse(&server.uri())?;
        Ok((
            HttpUserService::new(base.clone())?,
            HttpPasswordService::new(base)?,
        ))
    }

    #[test]
    fn endpoint_ignores_trailing_slashes() -> anyhow::Result<()> {
        let base = Url::parse("http://users.internal:8080/api/")?;
        assert_eq!(
            endpoint(&base, "/v1/users")?.as_str(),
            "http://users.internal:8080/api/v1/users"
        );
        Ok(())
    }

    #[tokio::test]
    async fn create_returns_the_minted_user_id() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let user_id = UserId::generate();
        Mock::given(method("POST"))
            .and(path("/v1/users"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "user_id": user_id })))
            .expect(1)
            .mount(&server)
            .await;

        let (users, _) = services(&server).await?;
        assert_eq!(users.create().await?, user_id);
        Ok(())
    }

    #[tokio::test]
    async fn sign_up_posts_credentials() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let user_id = UserId::generate();
        Mock::given(method("POST"))
            .and(path("/v1/credentials"))
            .and(body_json(json!({
                "user_id": user_id,
                "email": "a@example.com",
                "password": "hunter2",
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let (_, passwords) = services(&server).await?;
        passwords
            .sign_up(user_id, "a@example.com", &password())
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn sign_in_maps_statuses() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let user_id = UserId::generate();
        Mock::given(method("POST"))
            .and(path("/v1/credentials/sign-in"))
            .and(body_json(json!({ "email": "a@example.com", "password": "hunter2" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "user_id": user_id })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/credentials/sign-in"))
            .and(body_json(json!({ "email": "b@example.com", "password": "hunter2" })))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "bad password" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/credentials/sign-in"))
            .and(body_json(json!({ "email": "c@example.com", "password": "hunter2" })))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let (_, passwords) = services(&server).await?;
        assert_eq!(passwords.sign_in("a@example.com", &password()).await?, user_id);
        assert!(matches!(
            passwords.sign_in("b@example.com", &password()).await,
            Err(Error::Unauthorized)
        ));
        assert!(matches!(
            passwords.sign_in("c@example.com", &password()).await,
            Err(Error::NotFound("credential"))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn validation_errors_keep_the_remote_reason() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/credentials"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({ "error": "email already registered" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/users"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let (users, passwords) = services(&server).await?;
        let err = passwords
            .sign_up(UserId::generate(), "a@example.com", &password())
            .await
            .err();
        assert_eq!(
            err.map(|err| err.to_string()).as_deref(),
            Some("validation error: email already registered")
        );
        assert!(matches!(users.create().await, Err(Error::Unknown(_))));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_success_bodies_are_unknown() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "nope" })))
            .mount(&server)
            .await;

        let (users, _) = services(&server).await?;
        assert!(matches!(users.create().await, Err(Error::Unknown(_))));
        Ok(())
    }
}
