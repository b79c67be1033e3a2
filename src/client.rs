//! HTTP client for the portfolio server.
//!
//! `CommandPromptApi` is the seam the terminal talks through; `PortfolioClient`
//! is the reqwest-backed implementation that also fetches the proxied
//! repository list.

use async_trait::async_trait;
use portfolio_protocol::{ApiError, CommandEntry, CommandRequest, RepositorySummary, TerminalConfig};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-2xx status
    #[error("server rejected request (HTTP {status})")]
    Rejected { status: u16, body: Option<ApiError> },
    /// Connection failure or timeout
    #[error("network error: {0}")]
    Network(String),
    /// 2xx response whose body could not be decoded
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("invalid server URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Whether the server was reached and said no
    pub fn is_rejection(&self) -> bool {
        matches!(self, ClientError::Rejected { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

/// Terminal endpoint as seen by a session
#[async_trait]
pub trait CommandPromptApi: Send + Sync {
    /// GET /command-prompt
    async fn fetch_config(&self) -> Result<TerminalConfig, ClientError>;

    /// POST /command-prompt
    async fn execute_command(&self, command: &str) -> Result<CommandEntry, ClientError>;
}

/// reqwest-backed client for the portfolio server
pub struct PortfolioClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PortfolioClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("portfolio-terminal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with `segments` appended (each one percent-encoded)
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base() was rejected in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET /github/{username}/repositories
    pub async fn fetch_repositories(
        &self,
        username: &str,
    ) -> Result<Vec<RepositorySummary>, ClientError> {
        let url = self.endpoint(&["github", username, "repositories"]);
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        read_json(response).await
    }
}

#[async_trait]
impl CommandPromptApi for PortfolioClient {
    async fn fetch_config(&self) -> Result<TerminalConfig, ClientError> {
        let url = self.endpoint(&["command-prompt"]);
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        read_json(response).await
    }

    async fn execute_command(&self, command: &str) -> Result<CommandEntry, ClientError> {
        let url = self.endpoint(&["command-prompt"]);
        debug!("POST {} {:?}", url, command);
        let response = self
            .http
            .post(url)
            .json(&CommandRequest {
                command: command.to_string(),
            })
            .send()
            .await?;
        read_json(response).await
    }
}

/// Decode a 2xx JSON body, or turn the status (and any `{error}` body) into
/// `ClientError::Rejected`
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.json::<ApiError>().await.ok();
        return Err(ClientError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json::<T>().await?)
}
