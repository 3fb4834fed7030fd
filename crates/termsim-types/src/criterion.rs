//! Mission completion criteria evaluated against broadcast events.

use serde::{Deserialize, Serialize};

use crate::event::{AuthMethod, Event};

/// A predicate over a single [`Event`].
///
/// Lesson files describe criteria in TOML, tagged by `kind`:
///
/// ```toml
/// criterion = { kind = "commandText", contains = ["ssh", "-p 1234"] }
/// criterion = { kind = "connected", user = "root" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Criterion {
    /// A command with this (case-folded) name was submitted.
    Command { name: String },
    /// A submitted line contains every one of these substrings.
    CommandText { contains: Vec<String> },
    /// A login succeeded, optionally as a given user or via a given method.
    Connected {
        #[serde(default)]
        user: Option<String>,
        #[serde(default)]
        method: Option<AuthMethod>,
    },
    KeysCopied,
    KeygenDone,
    /// An `echo >>` append, optionally to a target containing this text.
    FileAppend {
        #[serde(default)]
        target: Option<String>,
    },
}

impl Criterion {
    pub fn matches(&self, event: &Event) -> bool {
        match (self, event) {
            (Self::Command { name }, Event::Command { name: got, .. }) => name == got,
            (Self::CommandText { contains }, Event::Command { full_text, .. }) => contains
                .iter()
                .all(|needle| full_text.contains(needle.as_str())),
            (
                Self::Connected { user, method },
                Event::Connected {
                    user: got_user,
                    method: got_method,
                    ..
                },
            ) => {
                user.as_ref().is_none_or(|u| u == got_user)
                    && method.is_none_or(|m| m == *got_method)
            },
            (Self::KeysCopied, Event::KeysCopied) | (Self::KeygenDone, Event::KeygenDone) => true,
            (Self::FileAppend { target }, Event::FileAppend { target: got, .. }) => {
                target.as_ref().is_none_or(|t| got.contains(t.as_str()))
            },
            _ => false,
        }
    }
}
