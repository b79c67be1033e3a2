//! Shared types and wire format for portfolio server ↔ terminal communication.
//!
//! This crate is intentionally lightweight (only `serde` + `serde_json`).
//! It defines:
//! - Terminal types exchanged on `/command-prompt` (CommandEntry, TerminalConfig)
//! - Repository proxy types returned by `/github/{username}/repositories`
//! - The generic `{error, details?}` error body

use serde::{Deserialize, Serialize};

// ── Routes ─────────────────────────────────────────────────────────

/// Default server listen address
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:3000";

/// Path of the terminal endpoint (GET config, POST command)
pub const COMMAND_PROMPT_PATH: &str = "/command-prompt";

/// Path of the repository proxy endpoint for `username`
pub fn repositories_path(username: &str) -> String {
    format!("/github/{}/repositories", username)
}

// ── Terminal types ─────────────────────────────────────────────────

/// Result of processing one command line.
///
/// At most one of `output` / `error` is set. `clear` is a side channel that
/// tells the client to wipe its transcript and takes precedence over both.
/// Absent fields are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clear: Option<bool>,
}

impl CommandEntry {
    pub fn output(text: impl Into<String>) -> Self {
        Self {
            output: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            error: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn clear() -> Self {
        Self {
            clear: Some(true),
            ..Self::default()
        }
    }

    /// Whether the client should reset its transcript
    pub fn is_clear(&self) -> bool {
        self.clear.unwrap_or(false)
    }
}

/// Request body for POST /command-prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

/// Response for GET /command-prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalConfig {
    /// Banner lines shown before the first prompt
    pub initial_text: Vec<String>,
    pub prompt: String,
    /// Window title
    pub title: String,
}

// ── Repository proxy types ─────────────────────────────────────────

/// One repository as reshaped by the proxy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySummary {
    pub name: String,
    pub description: String,
    pub stargazers_count: u64,
    /// Human readable size, e.g. `"512 KB"`
    pub size: String,
    /// Browser URL of the repository
    pub url: String,
}

/// Generic API error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}
