//! GitHub repository proxy
//!
//! Fetches `GET {api}/users/{username}/repos` and reshapes each item into a
//! `RepositorySummary`. Upstream failures are translated into a small set of
//! status-coded `ApiError` bodies.

use anyhow::Context;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use portfolio_protocol::{ApiError, RepositorySummary};
use reqwest::{header, Url};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Public GitHub REST API
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = "retro-portfolio";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const NO_DESCRIPTION: &str = "No description available";

/// Upstream client configuration
#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub api_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

/// Errors surfaced by the repository proxy
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Username parameter is required and must be a string")]
    MissingUsername,
    #[error("User not found")]
    UserNotFound { username: String },
    #[error("Rate limit exceeded or access forbidden")]
    Forbidden,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("GitHub API error")]
    Upstream { status: StatusCode },
    #[error("Invalid response format from GitHub API")]
    InvalidFormat,
    /// Transport or decoding failure; the message is logged, never returned
    #[error("Internal server error")]
    Internal(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingUsername => StatusCode::BAD_REQUEST,
            ProxyError::UserNotFound { .. } => StatusCode::NOT_FOUND,
            ProxyError::Forbidden => StatusCode::FORBIDDEN,
            ProxyError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProxyError::Upstream { status } => *status,
            ProxyError::InvalidFormat | ProxyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            ProxyError::MissingUsername => None,
            ProxyError::UserNotFound { username } => {
                Some(format!("GitHub user '{}' does not exist", username))
            }
            ProxyError::Forbidden => {
                Some("GitHub API rate limit reached or repository access denied".to_string())
            }
            ProxyError::Unauthorized => Some("GitHub API authentication failed".to_string()),
            ProxyError::Upstream { status } => Some(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )),
            ProxyError::InvalidFormat => Some("Expected an array of repositories".to_string()),
            ProxyError::Internal(_) => {
                Some("An unexpected error occurred while fetching repositories".to_string())
            }
        }
    }

    fn from_upstream_status(status: StatusCode, username: &str) -> Self {
        match status {
            StatusCode::NOT_FOUND => ProxyError::UserNotFound {
                username: username.to_string(),
            },
            StatusCode::FORBIDDEN => ProxyError::Forbidden,
            StatusCode::UNAUTHORIZED => ProxyError::Unauthorized,
            status => ProxyError::Upstream { status },
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = ApiError {
            error: self.to_string(),
            details: self.details(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Repository item as returned by GitHub (only the fields we reshape)
#[derive(Debug, Deserialize)]
struct UpstreamRepository {
    name: String,
    description: Option<String>,
    stargazers_count: u64,
    size: u64,
    html_url: String,
}

impl From<UpstreamRepository> for RepositorySummary {
    fn from(repo: UpstreamRepository) -> Self {
        Self {
            name: repo.name,
            description: repo
                .description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            stargazers_count: repo.stargazers_count,
            size: format!("{} KB", repo.size),
            url: repo.html_url,
        }
    }
}

/// HTTP client for the GitHub REST API
pub struct GithubClient {
    http: reqwest::Client,
    api_url: Url,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> anyhow::Result<Self> {
        let api_url = Url::parse(&config.api_url)
            .with_context(|| format!("Invalid GitHub API URL: {}", config.api_url))?;
        if api_url.cannot_be_a_base() {
            anyhow::bail!("GitHub API URL cannot be used as a base: {}", config.api_url);
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()
            .context("Failed to build GitHub HTTP client")?;

        Ok(Self { http, api_url })
    }

    fn repos_url(&self, username: &str) -> Url {
        let mut url = self.api_url.clone();
        // cannot_be_a_base() was rejected in new()
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["users", username, "repos"]);
        }
        url
    }

    /// Fetch and reshape the public repositories of `username`
    pub async fn list_repositories(
        &self,
        username: &str,
    ) -> Result<Vec<RepositorySummary>, ProxyError> {
        if username.trim().is_empty() {
            return Err(ProxyError::MissingUsername);
        }

        let url = self.repos_url(username);
        debug!("Fetching GitHub repositories: {}", url);

        let response = self
            .http
            .get(url.clone())
            .header(header::ACCEPT, GITHUB_ACCEPT)
            .send()
            .await
            .map_err(|e| ProxyError::Internal(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                username,
                url = %url,
                body = %body,
                "GitHub API error"
            );
            return Err(ProxyError::from_upstream_status(status, username));
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProxyError::Internal(format!("undecodable body from {}: {}", url, e)))?;

        let items = match data {
            serde_json::Value::Array(items) => items,
            other => {
                error!(username, data = %other, "GitHub API returned a non-array body");
                return Err(ProxyError::InvalidFormat);
            }
        };

        let repos = items
            .into_iter()
            .map(|item| serde_json::from_value::<UpstreamRepository>(item).map(RepositorySummary::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ProxyError::Internal(format!("malformed repository item: {}", e)))?;

        debug!("Fetched {} repositories for {}", repos.len(), username);
        Ok(repos)
    }
}
