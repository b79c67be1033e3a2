//! Drives a `Session` against a `CommandPromptApi`
//!
//! `Terminal` holds the session exclusively, so at most one request is ever
//! in flight; the session's busy flag still guards `submit` on its own.

use crate::client::CommandPromptApi;
use crate::terminal::session::Session;
use crate::terminal::transcript::TranscriptLine;

pub struct Terminal<A: CommandPromptApi> {
    api: A,
    session: Session,
}

impl<A: CommandPromptApi> Terminal<A> {
    pub fn new(api: A, session: Session) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch the server config and settle the session with it (or its fallback)
    pub async fn initialize(&mut self) -> &[TranscriptLine] {
        let fetched = self.api.fetch_config().await;
        self.session.initialize(fetched)
    }

    /// Run one line of input through the server and fold the answer back in.
    ///
    /// A no-op when the session is not idle.
    pub async fn run_command(&mut self, input: &str) -> &[TranscriptLine] {
        if !self.session.set_input(input) {
            return self.session.transcript();
        }
        let Some(command) = self.session.submit() else {
            return self.session.transcript();
        };
        let result = self.api.execute_command(&command).await;
        self.session.apply_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use crate::core::analytics::NullSink;
    use crate::terminal::session::{SessionDefaults, SessionState, NETWORK_ERROR_TEXT};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use portfolio_protocol::{CommandEntry, TerminalConfig};
    use std::sync::Arc;

    /// Canned server that records every command it receives
    #[derive(Default)]
    struct FakeApi {
        offline: bool,
        received: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommandPromptApi for FakeApi {
        async fn fetch_config(&self) -> Result<TerminalConfig, ClientError> {
            if self.offline {
                return Err(ClientError::Network("connection refused".to_string()));
            }
            Ok(TerminalConfig {
                initial_text: vec!["banner".to_string()],
                prompt: "C:\\>".to_string(),
                title: "MS-DOS Prompt".to_string(),
            })
        }

        async fn execute_command(&self, command: &str) -> Result<CommandEntry, ClientError> {
            self.received.lock().push(command.to_string());
            if self.offline {
                return Err(ClientError::Network("connection refused".to_string()));
            }
            Ok(match command {
                "cls" => CommandEntry::clear(),
                "help" => CommandEntry::output("no help for you"),
                other => CommandEntry::error(format!("unknown: {}", other)),
            })
        }
    }

    fn terminal(api: FakeApi) -> Terminal<FakeApi> {
        Terminal::new(api, Session::new(SessionDefaults::default(), Arc::new(NullSink)))
    }

    #[tokio::test]
    async fn test_initialize_then_run() {
        let mut term = terminal(FakeApi::default());
        assert_eq!(term.initialize().await.len(), 2);

        let transcript = term.run_command("help").await;
        assert_eq!(transcript.len(), 4);
        assert_eq!(transcript[1].text, "C:\\> help");
        assert_eq!(transcript[2].text, "no help for you");
        assert_eq!(term.api().received.lock().as_slice(), ["help"]);
    }

    #[tokio::test]
    async fn test_clear_resets_to_prompt() {
        let mut term = terminal(FakeApi::default());
        term.initialize().await;
        term.run_command("help").await;
        term.run_command("nope").await;
        assert_eq!(term.run_command("cls").await.len(), 1);
    }

    #[tokio::test]
    async fn test_offline_server_never_sticks() {
        let mut term = terminal(FakeApi {
            offline: true,
            ..FakeApi::default()
        });
        term.initialize().await;
        assert_eq!(term.session().state(), SessionState::Idle);

        let transcript = term.run_command("help").await;
        assert_eq!(transcript[transcript.len() - 2].text, NETWORK_ERROR_TEXT);
        assert_eq!(term.session().state(), SessionState::Idle);

        // Manual retry goes through again
        term.run_command("help").await;
        assert_eq!(term.api().received.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_busy_session_issues_no_request() {
        let mut term = terminal(FakeApi::default());
        term.initialize().await;
        term.session_mut().set_input("help");
        term.session_mut().submit().unwrap();

        let before = term.session().transcript().to_vec();
        let after = term.run_command("help").await.to_vec();
        assert_eq!(before, after);
        assert!(term.api().received.lock().is_empty());
    }

    #[tokio::test]
    async fn test_uninitialized_session_issues_no_request() {
        let mut term = terminal(FakeApi::default());
        assert!(term.run_command("help").await.is_empty());
        assert!(term.api().received.lock().is_empty());
    }
}
