//! Transcript lines

/// What a transcript line represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// A prompt, either empty (awaiting input) or echoing a submitted command
    Command,
    Output,
    /// Rendered in a distinct color; otherwise just a tagged line
    Error,
}

/// One rendered line of the terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub kind: LineKind,
    pub text: String,
}

impl TranscriptLine {
    pub fn command(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Command,
            text: text.into(),
        }
    }

    pub fn output(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Output,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Error,
            text: text.into(),
        }
    }

    pub fn is_command(&self) -> bool {
        self.kind == LineKind::Command
    }
}
