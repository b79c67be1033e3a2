//! Server shared state

use crate::github::GithubClient;
use crate::processor::CommandProcessor;

/// Shared state across request handlers (must be Send + Sync for axum).
///
/// Everything here is immutable after start-up, so handlers never lock.
pub struct ServerState {
    /// Terminal command dispatcher
    pub processor: CommandProcessor,
    /// Upstream client for the repository proxy
    pub github: GithubClient,
}

impl ServerState {
    pub fn new(processor: CommandProcessor, github: GithubClient) -> Self {
        Self { processor, github }
    }
}
