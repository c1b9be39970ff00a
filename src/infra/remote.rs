//! Client for the REST API of another greeting service instance.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::application::ports::{ExternalGreetingClient, RemoteError};
use crate::domain::greeting::Greeting;
use crate::infra::http::handlers::GreetingResponse;

#[derive(Serialize)]
struct CreateBody<'a> {
    name: &'a str,
}

#[derive(Clone, Debug)]
pub struct HttpGreetingClient {
    client: Client,
    base: Url,
}

impl HttpGreetingClient {
    pub fn new(base: &str) -> Result<Self, RemoteError> {
        let base = Url::parse(base)
            .and_then(|url| url.join("/"))
            .map_err(|err| RemoteError::Endpoint(err.to_string()))?;
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .build()
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        Ok(Self { client, base })
    }

    pub fn user_agent() -> &'static str {
        concat!("greeter/", env!("CARGO_PKG_VERSION"))
    }

    fn url(&self, path: &str) -> Result<Url, RemoteError> {
        self.base
            .join(path)
            .map_err(|err| RemoteError::Endpoint(err.to_string()))
    }

    async fn decode(response: reqwest::Response) -> Result<Greeting, RemoteError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        let body: GreetingResponse =
            serde_json::from_slice(&bytes).map_err(|err| RemoteError::Decode(err.to_string()))?;
        Greeting::new(body.id, body.message).map_err(|err| RemoteError::Decode(err.to_string()))
    }
}

#[async_trait]
impl ExternalGreetingClient for HttpGreetingClient {
    async fn fetch_greeting(&self, id: Uuid) -> Result<Option<Greeting>, RemoteError> {
        let url = self.url(&format!("api/v1/greetings/{id}"))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| RemoteError::Transport(err.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(response).await.map(Some)
    }

    async fn create_remote_greeting(&self, name: &str) -> Result<Greeting, RemoteError> {
        let url = self.url("api/v1/greetings")?;
        let response = self
            .client
            .post(url)
            .json(&CreateBody { name })
            .send()
            .await
            .map_err(|err| RemoteError::Transport(err.to_string()))?;

        Self::decode(response).await
    }
}
