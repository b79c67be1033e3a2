//! HTTP endpoints
//!
//! `/command-prompt` serves the terminal banner (GET) and runs one command
//! line per request (POST). `/github/{username}/repositories` proxies the
//! GitHub repository list. Handlers are stateless; all state is read-only.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use portfolio_protocol::{ApiError, RepositorySummary, TerminalConfig};
use std::sync::Arc;
use tracing::{debug, error};

use crate::github::ProxyError;
use crate::state::ServerState;

/// Returned when the POST body is not JSON at all
const INVALID_JSON: &str = "Invalid JSON request";

/// GET /command-prompt
pub async fn get_command_prompt(State(state): State<Arc<ServerState>>) -> Json<TerminalConfig> {
    Json(state.processor.table().config().clone())
}

/// POST /command-prompt
///
/// The body is read as raw bytes so a missing `Content-Type` header is not
/// rejected before we can answer with our own error body.
pub async fn post_command_prompt(State(state): State<Arc<ServerState>>, body: Bytes) -> Response {
    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            debug!("Rejecting undecodable command body: {}", e);
            return (StatusCode::BAD_REQUEST, Json(ApiError::new(INVALID_JSON))).into_response();
        }
    };

    let command = match payload.get("command").and_then(serde_json::Value::as_str) {
        Some(command) if !command.is_empty() => command,
        _ => {
            let message = &state.processor.table().errors().invalid_command;
            return (StatusCode::BAD_REQUEST, Json(ApiError::new(message.as_str()))).into_response();
        }
    };

    debug!("Processing command: {:?}", command);
    Json(state.processor.process(command)).into_response()
}

/// GET /github/{username}/repositories
pub async fn get_repositories(
    State(state): State<Arc<ServerState>>,
    Path(username): Path<String>,
) -> Result<Json<Vec<RepositorySummary>>, ProxyError> {
    match state.github.list_repositories(&username).await {
        Ok(repos) => Ok(Json(repos)),
        Err(ProxyError::Internal(cause)) => {
            error!(
                username = %username,
                method = "GET",
                path = %portfolio_protocol::repositories_path(&username),
                cause = %cause,
                "Unexpected error in repositories proxy"
            );
            Err(ProxyError::Internal(cause))
        }
        Err(e) => Err(e),
    }
}
