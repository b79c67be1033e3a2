//! Line renderer for a text console
//!
//! Rendering is a projection of the transcript: the renderer only remembers
//! how many lines are already on screen and writes the ones after them. A
//! transcript shorter than what has been shown means the screen was cleared.

use std::io::{self, Write};

use crate::terminal::transcript::{LineKind, TranscriptLine};

const SGR_RED: &str = "\x1b[31m";
const SGR_RESET: &str = "\x1b[0m";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub struct Renderer {
    /// Lines fully written, newline included
    committed: usize,
    /// The line at `committed` is a prompt written without a newline
    prompt_pending: bool,
    /// Whether the console echoes what the user types after the prompt
    input_echoed: bool,
    /// Use ANSI escapes for color and screen clearing
    ansi: bool,
}

impl Renderer {
    pub fn new(input_echoed: bool, ansi: bool) -> Self {
        Self {
            committed: 0,
            prompt_pending: false,
            input_echoed,
            ansi,
        }
    }

    /// Number of transcript lines the screen currently reflects
    pub fn shown(&self) -> usize {
        self.committed + usize::from(self.prompt_pending)
    }

    /// Set the console window title
    pub fn render_title<W: Write>(&self, out: &mut W, title: &str) -> io::Result<()> {
        if self.ansi {
            write!(out, "\x1b]0;{}\x07", title)?;
            out.flush()?;
        }
        Ok(())
    }

    /// Write every line not yet on screen
    pub fn render<W: Write>(&mut self, out: &mut W, transcript: &[TranscriptLine]) -> io::Result<()> {
        if self.shown() > 0 && transcript.len() <= self.shown() {
            if self.ansi {
                write!(out, "{}", CLEAR_SCREEN)?;
            } else if self.prompt_pending && !self.input_echoed {
                writeln!(out)?;
            }
            self.committed = 0;
            self.prompt_pending = false;
        }

        if self.prompt_pending {
            // The prompt line now carries the submitted command
            if !self.input_echoed {
                if let Some(line) = transcript.get(self.committed) {
                    write!(out, "\r{}", line.text)?;
                }
                writeln!(out)?;
            }
            self.committed += 1;
            self.prompt_pending = false;
        }

        for (i, line) in transcript.iter().enumerate().skip(self.committed) {
            let last = i + 1 == transcript.len();
            if last && line.kind == LineKind::Command {
                write!(out, "{} ", line.text)?;
                self.prompt_pending = true;
                break;
            }
            self.write_line(out, line)?;
            self.committed = i + 1;
        }

        out.flush()
    }

    fn write_line<W: Write>(&self, out: &mut W, line: &TranscriptLine) -> io::Result<()> {
        match line.kind {
            LineKind::Error if self.ansi => writeln!(out, "{}{}{}", SGR_RED, line.text, SGR_RESET),
            _ => writeln!(out, "{}", line.text),
        }
    }
}
