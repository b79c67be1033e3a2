//! Terminal session state machine
//!
//! A `Session` owns the transcript, the input buffer and the busy flag. It
//! performs no I/O: the caller fetches the configuration and runs commands,
//! then feeds the outcome back through `initialize` / `apply_result`.
//!
//! ```text
//! Uninitialized --initialize--> Idle --submit--> AwaitingResponse
//!                                ^                      |
//!                                +-----apply_result-----+
//! ```

use portfolio_protocol::{CommandEntry, TerminalConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::ClientError;
use crate::core::analytics::{AnalyticsEvent, AnalyticsSink, CATEGORY_ERROR, CATEGORY_INTERACTION};
use crate::terminal::transcript::TranscriptLine;

/// Unique identifier for a session
pub type SessionId = Uuid;

pub const DEFAULT_PROMPT: &str = "C:\\>";
pub const DEFAULT_TITLE: &str = "MS-DOS Prompt";

/// Shown when the server answered with a non-2xx status
pub const API_ERROR_TEXT: &str = "Error: Could not process command";
/// Shown when the server could not be reached or answered garbage
pub const NETWORK_ERROR_TEXT: &str = "Error: Network connection failed";

/// Caller-supplied values that override or stand in for the server config
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDefaults {
    /// Banner lines; replaces the server banner when set
    #[serde(default)]
    pub initial_text: Option<Vec<String>>,
    /// Prompt used until (and unless) the server config arrives
    #[serde(default)]
    pub prompt: Option<String>,
    /// Window title; replaces the server title when set
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the configuration fetch to settle
    Uninitialized,
    /// Accepting input
    Idle,
    /// One command in flight; further submits are ignored
    AwaitingResponse,
}

pub struct Session {
    id: SessionId,
    defaults: SessionDefaults,
    transcript: Vec<TranscriptLine>,
    prompt: String,
    title: String,
    input: String,
    state: SessionState,
    /// Command awaiting its response
    in_flight: Option<String>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl Session {
    pub fn new(defaults: SessionDefaults, analytics: Arc<dyn AnalyticsSink>) -> Self {
        let prompt = defaults
            .prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string());
        let title = defaults
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        Self {
            id: Uuid::new_v4(),
            defaults,
            transcript: Vec::new(),
            prompt,
            title,
            input: String::new(),
            state: SessionState::Uninitialized,
            in_flight: None,
            analytics,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn transcript(&self) -> &[TranscriptLine] {
        &self.transcript
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state == SessionState::AwaitingResponse
    }

    /// Replace the input buffer. Ignored while a command is in flight.
    pub fn set_input(&mut self, text: impl Into<String>) -> bool {
        if self.is_busy() {
            return false;
        }
        self.input = text.into();
        true
    }

    /// Settle the configuration fetch, falling back to the caller defaults
    pub fn initialize(&mut self, fetched: Result<TerminalConfig, ClientError>) -> &[TranscriptLine] {
        if self.is_busy() {
            warn!(session = %self.id, "Ignoring initialize while a command is in flight");
            return &self.transcript;
        }

        let banner = match fetched {
            Ok(config) => {
                self.prompt = config.prompt;
                self.title = self.defaults.title.clone().unwrap_or(config.title);
                self.record(
                    AnalyticsEvent::new("terminal_initialized", CATEGORY_INTERACTION)
                        .with_label("success"),
                );
                self.defaults.initial_text.clone().unwrap_or(config.initial_text)
            }
            Err(e) => {
                warn!(session = %self.id, "Failed to load terminal config: {}", e);
                let event = if e.is_rejection() {
                    AnalyticsEvent::new("terminal_initialized", CATEGORY_INTERACTION)
                        .with_label("fallback")
                } else {
                    AnalyticsEvent::new("terminal_initialization_error", CATEGORY_ERROR)
                        .with_label("config_load_failed")
                };
                self.record(event);
                self.defaults.initial_text.clone().unwrap_or_default()
            }
        };

        self.transcript = banner.into_iter().map(TranscriptLine::output).collect();
        self.transcript.push(TranscriptLine::command(self.prompt.clone()));
        self.state = SessionState::Idle;
        &self.transcript
    }

    /// Start running the current input.
    ///
    /// Returns the command to send, or `None` when the session is not idle.
    /// The trailing prompt line is replaced by the echoed command; the input
    /// buffer is left untouched until the response settles.
    pub fn submit(&mut self) -> Option<String> {
        if self.state != SessionState::Idle {
            debug!(session = %self.id, state = ?self.state, "Ignoring submit");
            return None;
        }

        let command = self.input.trim().to_string();
        let echoed = TranscriptLine::command(format!("{} {}", self.prompt, command));
        match self.transcript.last_mut() {
            Some(last) if last.is_command() => *last = echoed,
            _ => self.transcript.push(echoed),
        }

        self.record(
            AnalyticsEvent::new("terminal_command_executed", CATEGORY_INTERACTION)
                .with_label(command.to_lowercase()),
        );

        self.state = SessionState::AwaitingResponse;
        self.in_flight = Some(command.clone());
        Some(command)
    }

    /// Settle the in-flight command with the server's answer
    pub fn apply_result(&mut self, result: Result<CommandEntry, ClientError>) -> &[TranscriptLine] {
        if !self.is_busy() {
            warn!(session = %self.id, "Ignoring result with no command in flight");
            return &self.transcript;
        }

        let command = self.in_flight.take().unwrap_or_default();
        let word = first_word(&command);

        match result {
            Ok(entry) if entry.is_clear() => {
                self.transcript = vec![TranscriptLine::command(self.prompt.clone())];
                self.record(
                    AnalyticsEvent::new("terminal_screen_cleared", CATEGORY_INTERACTION)
                        .with_label("cls"),
                );
            }
            Ok(entry) => {
                if let Some(output) = entry.output {
                    self.transcript.push(TranscriptLine::output(output));
                    self.record(
                        AnalyticsEvent::new("terminal_command_success", CATEGORY_INTERACTION)
                            .with_label(word),
                    );
                } else if let Some(error) = entry.error {
                    self.transcript.push(TranscriptLine::error(error));
                    self.record(
                        AnalyticsEvent::new("terminal_command_error", CATEGORY_INTERACTION)
                            .with_label(word),
                    );
                }
                self.push_prompt();
            }
            Err(e) => {
                warn!(session = %self.id, command = %command, "Command failed: {}", e);
                let (text, event) = match &e {
                    ClientError::Rejected { status, .. } => (
                        API_ERROR_TEXT,
                        AnalyticsEvent::new("terminal_api_error", CATEGORY_ERROR)
                            .with_label(format!("command: {}, status: {}", word, status)),
                    ),
                    _ => (
                        NETWORK_ERROR_TEXT,
                        AnalyticsEvent::new("terminal_network_error", CATEGORY_ERROR)
                            .with_label(format!("command: {}", word)),
                    ),
                };
                self.transcript.push(TranscriptLine::error(text));
                self.push_prompt();
                self.record(event);
            }
        }

        self.input.clear();
        self.state = SessionState::Idle;
        &self.transcript
    }

    /// Reset the transcript to a single prompt line without a round-trip.
    /// Ignored while a command is in flight.
    pub fn clear(&mut self) -> &[TranscriptLine] {
        if self.state != SessionState::Idle {
            return &self.transcript;
        }
        self.transcript = vec![TranscriptLine::command(self.prompt.clone())];
        self.record(
            AnalyticsEvent::new("terminal_manually_cleared", CATEGORY_INTERACTION)
                .with_label("manual_clear"),
        );
        &self.transcript
    }

    fn push_prompt(&mut self) {
        self.transcript.push(TranscriptLine::command(self.prompt.clone()));
    }

    fn record(&self, event: AnalyticsEvent) {
        self.analytics.record(event.with_value(1));
    }
}

/// Lowercased first space-separated word, used as the analytics label
fn first_word(command: &str) -> String {
    command
        .to_lowercase()
        .split(' ')
        .next()
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analytics::MemorySink;
    use crate::terminal::transcript::LineKind;

    fn config() -> TerminalConfig {
        TerminalConfig {
            initial_text: vec!["Microsoft(R) Windows 98".to_string(), String::new()],
            prompt: "C:\\>".to_string(),
            title: "MS-DOS Prompt".to_string(),
        }
    }

    fn session_with(defaults: SessionDefaults) -> (Session, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (Session::new(defaults, sink.clone()), sink)
    }

    fn ready_session() -> (Session, Arc<MemorySink>) {
        let (mut session, sink) = session_with(SessionDefaults::default());
        session.initialize(Ok(config()));
        (session, sink)
    }

    fn run(session: &mut Session, input: &str, result: Result<CommandEntry, ClientError>) {
        session.set_input(input);
        session.submit().unwrap();
        session.apply_result(result);
    }

    #[test]
    fn test_new_session_is_uninitialized() {
        let (mut session, _) = session_with(SessionDefaults::default());
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(session.transcript().is_empty());
        session.set_input("help");
        assert_eq!(session.submit(), None);
    }

    #[test]
    fn test_initialize_with_server_config() {
        let (session, sink) = ready_session();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.title(), "MS-DOS Prompt");
        let transcript = session.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[0], TranscriptLine::output("Microsoft(R) Windows 98"));
        assert_eq!(transcript[2], TranscriptLine::command("C:\\>"));
        assert_eq!(sink.names(), vec!["terminal_initialized"]);
        assert_eq!(sink.events()[0].label.as_deref(), Some("success"));
    }

    #[test]
    fn test_initialize_prefers_caller_banner_and_title() {
        let (mut session, _) = session_with(SessionDefaults {
            initial_text: Some(vec!["custom".to_string()]),
            prompt: Some("$".to_string()),
            title: Some("My Terminal".to_string()),
        });
        session.initialize(Ok(config()));
        assert_eq!(session.title(), "My Terminal");
        // The server prompt wins once the config arrives
        assert_eq!(session.prompt(), "C:\\>");
        assert_eq!(
            session.transcript(),
            &[TranscriptLine::output("custom"), TranscriptLine::command("C:\\>")]
        );
    }

    #[test]
    fn test_initialize_fallback_on_rejection() {
        let (mut session, sink) = session_with(SessionDefaults {
            initial_text: Some(vec!["offline banner".to_string()]),
            prompt: Some("A:\\>".to_string()),
            title: None,
        });
        session.initialize(Err(ClientError::Rejected { status: 500, body: None }));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.title(), DEFAULT_TITLE);
        assert_eq!(
            session.transcript(),
            &[TranscriptLine::output("offline banner"), TranscriptLine::command("A:\\>")]
        );
        assert_eq!(sink.events()[0].label.as_deref(), Some("fallback"));
    }

    #[test]
    fn test_initialize_fallback_on_network_error() {
        let (mut session, sink) = session_with(SessionDefaults::default());
        session.initialize(Err(ClientError::Network("connection refused".to_string())));
        assert_eq!(session.transcript(), &[TranscriptLine::command(DEFAULT_PROMPT)]);
        assert_eq!(sink.names(), vec!["terminal_initialization_error"]);
        assert_eq!(sink.events()[0].category, CATEGORY_ERROR);
    }

    #[test]
    fn test_submit_echoes_command_and_keeps_input() {
        let (mut session, _) = ready_session();
        session.set_input("  help ");
        assert_eq!(session.submit().as_deref(), Some("help"));
        assert!(session.is_busy());
        assert_eq!(session.input(), "  help ");
        assert_eq!(
            session.transcript().last(),
            Some(&TranscriptLine::command("C:\\> help"))
        );
        assert_eq!(session.transcript().len(), 3);
    }

    #[test]
    fn test_submit_while_busy_is_noop() {
        let (mut session, sink) = ready_session();
        session.set_input("help");
        session.submit().unwrap();
        let before = session.transcript().to_vec();
        let events_before = sink.events().len();

        assert!(!session.set_input("about"));
        assert_eq!(session.submit(), None);
        assert_eq!(session.transcript(), before.as_slice());
        assert_eq!(session.input(), "help");
        assert_eq!(sink.events().len(), events_before);
    }

    #[test]
    fn test_output_appends_line_and_prompt() {
        let (mut session, sink) = ready_session();
        run(&mut session, "about", Ok(CommandEntry::output("about me")));

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 5);
        assert_eq!(transcript[2], TranscriptLine::command("C:\\> about"));
        assert_eq!(transcript[3], TranscriptLine::output("about me"));
        assert_eq!(transcript[4], TranscriptLine::command("C:\\>"));
        assert_eq!(session.input(), "");
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(
            sink.names(),
            vec!["terminal_initialized", "terminal_command_executed", "terminal_command_success"]
        );
    }

    #[test]
    fn test_error_appends_error_line() {
        let (mut session, sink) = ready_session();
        run(&mut session, "Frob nicate", Ok(CommandEntry::error("Bad command")));

        let transcript = session.transcript();
        assert_eq!(transcript[3].kind, LineKind::Error);
        assert_eq!(transcript[3].text, "Bad command");
        assert!(transcript[4].is_command());
        let last = sink.events().pop().unwrap();
        assert_eq!(last.name, "terminal_command_error");
        assert_eq!(last.label.as_deref(), Some("frob"));
    }

    #[test]
    fn test_clear_wins_over_output() {
        let (mut session, sink) = ready_session();
        for _ in 0..3 {
            run(&mut session, "about", Ok(CommandEntry::output("about me")));
        }
        assert!(session.transcript().len() > 1);

        let mut entry = CommandEntry::clear();
        entry.output = Some("ignored".to_string());
        run(&mut session, "cls", Ok(entry));

        assert_eq!(session.transcript(), &[TranscriptLine::command("C:\\>")]);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(sink.names().last().map(String::as_str), Some("terminal_screen_cleared"));
    }

    #[test]
    fn test_server_rejection_line() {
        let (mut session, sink) = ready_session();
        run(
            &mut session,
            "",
            Err(ClientError::Rejected { status: 400, body: None }),
        );
        let transcript = session.transcript();
        assert_eq!(transcript[3], TranscriptLine::error(API_ERROR_TEXT));
        assert!(transcript[4].is_command());
        assert!(!session.is_busy());
        let last = sink.events().pop().unwrap();
        assert_eq!(last.name, "terminal_api_error");
        assert_eq!(last.label.as_deref(), Some("command: , status: 400"));
    }

    #[test]
    fn test_network_failure_line() {
        let (mut session, _) = ready_session();
        run(&mut session, "help", Err(ClientError::Network("timed out".to_string())));
        assert_eq!(session.transcript()[3], TranscriptLine::error(NETWORK_ERROR_TEXT));
        assert_eq!(session.input(), "");

        run(&mut session, "help", Err(ClientError::Decode("eof".to_string())));
        assert_eq!(session.transcript()[5], TranscriptLine::error(NETWORK_ERROR_TEXT));
    }

    #[test]
    fn test_transcript_grows_by_two_per_command() {
        let (mut session, _) = ready_session();
        let start = session.transcript().len();
        run(&mut session, "ver", Ok(CommandEntry::output("Windows 98")));
        assert_eq!(session.transcript().len(), start + 2);
        run(&mut session, "ver", Ok(CommandEntry::output("Windows 98")));
        assert_eq!(session.transcript().len(), start + 4);
    }

    #[test]
    fn test_empty_entry_only_adds_prompt() {
        let (mut session, _) = ready_session();
        let start = session.transcript().len();
        run(&mut session, "noop", Ok(CommandEntry::default()));
        assert_eq!(session.transcript().len(), start + 1);
    }

    #[test]
    fn test_apply_result_without_submit_is_ignored() {
        let (mut session, _) = ready_session();
        let before = session.transcript().to_vec();
        session.apply_result(Ok(CommandEntry::output("stray")));
        assert_eq!(session.transcript(), before.as_slice());
    }

    #[test]
    fn test_manual_clear() {
        let (mut session, sink) = ready_session();
        run(&mut session, "about", Ok(CommandEntry::output("about me")));
        assert_eq!(session.clear(), &[TranscriptLine::command("C:\\>")]);
        assert_eq!(sink.names().last().map(String::as_str), Some("terminal_manually_cleared"));
    }

    #[test]
    fn test_manual_clear_ignored_while_busy() {
        let (mut session, _) = ready_session();
        session.set_input("about");
        session.submit().unwrap();
        let len = session.transcript().len();
        assert_eq!(session.clear().len(), len);
    }

    #[test]
    fn test_first_word() {
        assert_eq!(first_word("ECHO Hello"), "echo");
        assert_eq!(first_word(""), "");
    }
}
