//! Command table: canned responses, error templates and the terminal banner
//!
//! The table is data, not code. The built-in table is compiled into the binary
//! from `config/terminal.toml` and can be replaced at start-up with a file of
//! the same shape.

use portfolio_protocol::{CommandEntry, TerminalConfig};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Placeholder substituted in the unknown-command template
pub const COMMAND_PLACEHOLDER: &str = "{{command}}";

/// Built-in table embedded in the binary
const BUILTIN_TABLE: &str = include_str!("../config/terminal.toml");

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read command table {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse command table: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Command key {0:?} must be lowercase")]
    NonLowercaseKey(String),
    #[error("ASCII art {0:?} is defined more than once")]
    DuplicateArtKey(String),
}

/// Error message templates
#[derive(Debug, Clone, Deserialize)]
pub struct TerminalErrors {
    /// Returned for unrecognized input; contains `{{command}}`
    pub unknown_command: String,
    /// Returned when the request carries no usable command
    pub invalid_command: String,
}

/// One named piece of ASCII art
#[derive(Debug, Clone, Deserialize)]
pub struct AsciiArt {
    pub key: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BannerSection {
    #[serde(default)]
    initial_text: Vec<String>,
    prompt: String,
    title: String,
}

/// On-disk layout of a command table
#[derive(Debug, Deserialize)]
struct TableFile {
    config: BannerSection,
    errors: TerminalErrors,
    #[serde(default)]
    commands: HashMap<String, CommandEntry>,
    #[serde(default)]
    ascii: Vec<AsciiArt>,
}

/// Immutable lookup structure behind the command processor
#[derive(Debug, Clone)]
pub struct CommandTable {
    config: TerminalConfig,
    errors: TerminalErrors,
    commands: HashMap<String, CommandEntry>,
    /// Kept in definition order; the order is user-visible
    ascii: Vec<AsciiArt>,
}

impl CommandTable {
    /// Parse the table compiled into the binary
    pub fn builtin() -> Result<Self, TableError> {
        Self::from_toml_str(BUILTIN_TABLE)
    }

    /// Load a table from a TOML file
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let content = std::fs::read_to_string(path).map_err(|source| TableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, TableError> {
        let file: TableFile = toml::from_str(content)?;

        if let Some(key) = file.commands.keys().find(|k| k.to_lowercase() != **k) {
            return Err(TableError::NonLowercaseKey(key.clone()));
        }

        let mut seen = HashSet::new();
        for art in &file.ascii {
            if !seen.insert(art.key.as_str()) {
                return Err(TableError::DuplicateArtKey(art.key.clone()));
            }
        }

        if !file.errors.unknown_command.contains(COMMAND_PLACEHOLDER) {
            tracing::warn!(
                "Unknown-command template has no {} placeholder",
                COMMAND_PLACEHOLDER
            );
        }

        Ok(Self {
            config: TerminalConfig {
                initial_text: file.config.initial_text,
                prompt: file.config.prompt,
                title: file.config.title,
            },
            errors: file.errors,
            commands: file.commands,
            ascii: file.ascii,
        })
    }

    /// Banner, prompt and title served to new sessions
    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn errors(&self) -> &TerminalErrors {
        &self.errors
    }

    /// Exact lookup by lowercase key
    pub fn lookup(&self, key: &str) -> Option<&CommandEntry> {
        self.commands.get(key)
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    pub fn art(&self, key: &str) -> Option<&AsciiArt> {
        self.ascii.iter().find(|art| art.key == key)
    }

    /// Art keys in definition order
    pub fn art_keys(&self) -> impl Iterator<Item = &str> {
        self.ascii.iter().map(|art| art.key.as_str())
    }

    /// Render the unknown-command message for `command`
    pub fn unknown_command(&self, command: &str) -> String {
        self.errors
            .unknown_command
            .replacen(COMMAND_PLACEHOLDER, command, 1)
    }
}
