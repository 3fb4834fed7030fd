//! Transcript entries rendered by the host UI.
//!
//! The transcript is append-only and purely observational: command logic
//! never reads it back.

use serde::{Deserialize, Serialize};

/// Rendering hint for a transcript line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Normal,
    /// An interactive prompt awaiting input (password, passphrase, yes/no).
    Prompt,
    /// Something the learner should notice (host authenticity warnings).
    Warning,
    /// A failed command.
    Error,
    /// The remote login banner.
    Banner,
}

/// Who produced a transcript line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Role {
    /// Echo of a submitted command, with the identity captured at
    /// submission time.
    Command { user: String, host: String },
    Output,
}

/// A single line of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub text: String,
    pub style: Style,
}

impl TranscriptEntry {
    /// An output line with the default style.
    pub fn output(text: impl Into<String>) -> Self {
        Self::styled(text, Style::Normal)
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        Self {
            role: Role::Output,
            text: text.into(),
            style,
        }
    }

    /// Echo of a submitted command line.
    pub fn command(text: impl Into<String>, user: &str, host: &str) -> Self {
        Self {
            role: Role::Command {
                user: user.to_string(),
                host: host.to_string(),
            },
            text: text.into(),
            style: Style::Normal,
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(self.role, Role::Command { .. })
    }
}
