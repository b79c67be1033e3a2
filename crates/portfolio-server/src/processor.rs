//! Command processor: turns one free-text command line into a `CommandEntry`
//!
//! Dispatch order (first match wins):
//! 1. exact table lookup on the trimmed, lowercased input
//! 2. `date`
//! 3. `time`
//! 4. `echo <text>`
//! 5. `ascii <key>`
//! 6. unknown-command template
//!
//! Table lookup runs first, so a table entry named `date` or `time` shadows
//! the live clock.

use chrono::{Local, NaiveDateTime};
use portfolio_protocol::CommandEntry;

use crate::table::CommandTable;

const ECHO_PREFIX: &str = "echo ";
const ASCII_PREFIX: &str = "ascii ";

/// Stateless dispatcher over an immutable command table
#[derive(Debug, Clone)]
pub struct CommandProcessor {
    table: CommandTable,
}

impl CommandProcessor {
    pub fn new(table: CommandTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    /// Process `raw` against the local wall clock
    pub fn process(&self, raw: &str) -> CommandEntry {
        self.process_at(raw, Local::now().naive_local())
    }

    /// Process `raw` with `now` as the current local time
    pub fn process_at(&self, raw: &str, now: NaiveDateTime) -> CommandEntry {
        let trimmed = raw.trim();
        let cmd = trimmed.to_lowercase();

        if let Some(entry) = self.table.lookup(&cmd) {
            return entry.clone();
        }

        if cmd == "date" {
            return CommandEntry::output(now.format("%A, %B %-d, %Y").to_string());
        }

        if cmd == "time" {
            return CommandEntry::output(format!(
                "The current time is: {}",
                now.format("%-I:%M:%S %p")
            ));
        }

        // Payload keeps the caller's casing and inner whitespace
        if let Some(text) = strip_prefix_ignore_case(trimmed, ECHO_PREFIX) {
            return CommandEntry::output(text);
        }

        if let Some(rest) = strip_prefix_ignore_case(trimmed, ASCII_PREFIX) {
            return self.ascii(&rest.trim().to_lowercase());
        }

        CommandEntry::error(self.table.unknown_command(raw))
    }

    fn ascii(&self, key: &str) -> CommandEntry {
        match self.table.art(key) {
            Some(art) => CommandEntry::output(art.lines.join("\n")),
            None => {
                let available: Vec<&str> = self.table.art_keys().collect();
                CommandEntry::error(format!(
                    "ASCII art for \"{}\" not found. Available options: {}",
                    key,
                    available.join(", ")
                ))
            }
        }
    }
}

/// Strip an ASCII `prefix` from `s`, comparing case-insensitively
fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
