//! Terminal module - Interactive command prompt
//!
//! This module provides:
//! - `Session`: transcript and busy-state machine, free of I/O
//! - `Terminal`: drives a session against a `CommandPromptApi`
//! - `Renderer`: writes transcript changes to a text console

mod render;
mod runner;
mod session;
mod transcript;

pub use render::Renderer;
pub use runner::Terminal;
pub use session::{
    Session, SessionDefaults, SessionId, SessionState, API_ERROR_TEXT, DEFAULT_PROMPT,
    DEFAULT_TITLE, NETWORK_ERROR_TEXT,
};
pub use transcript::{LineKind, TranscriptLine};
