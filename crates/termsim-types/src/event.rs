//! Broadcast events emitted by the engine for lesson-progress tracking.
//!
//! Events are one-way: the engine emits them and never reads them back.
//! The serialized form is the wire shape host pages consume, e.g.
//! `{"type":"connected","user":"alumno","host":"192.168.1.43","method":"key"}`.

use serde::{Deserialize, Serialize};

/// How a simulated login was authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Password,
    Key,
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password => f.write_str("password"),
            Self::Key => f.write_str("key"),
        }
    }
}

/// One interpreter-level occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    /// A command line was submitted (emitted before dispatch, even for
    /// unknown commands).
    #[serde(rename_all = "camelCase")]
    Command {
        /// Case-folded command name.
        name: String,
        /// The trimmed line as typed.
        full_text: String,
        args: Vec<String>,
        /// Identity at submission time.
        actor_user: String,
        actor_host: String,
    },
    /// A simulated remote session was established.
    Connected {
        user: String,
        host: String,
        method: AuthMethod,
    },
    /// Public key installed on the lesson target.
    KeysCopied,
    /// The key-generation wizard completed.
    KeygenDone,
    /// `echo ... >> target` was submitted.
    FileAppend { target: String, content: String },
}

impl Event {
    /// The `type` tag of this event, as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Command { .. } => "command",
            Self::Connected { .. } => "connected",
            Self::KeysCopied => "keysCopied",
            Self::KeygenDone => "keygenDone",
            Self::FileAppend { .. } => "fileAppend",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn command_event_wire_shape() {
        let e = Event::Command {
            name: "ssh".into(),
            full_text: "ssh alumno@192.168.1.43 -p 1234".into(),
            args: vec!["alumno@192.168.1.43".into(), "-p".into(), "1234".into()],
            actor_user: "alumno".into(),
            actor_host: "laptop-local".into(),
        };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(
            v,
            json!({
                "type": "command",
                "name": "ssh",
                "fullText": "ssh alumno@192.168.1.43 -p 1234",
                "args": ["alumno@192.168.1.43", "-p", "1234"],
                "actorUser": "alumno",
                "actorHost": "laptop-local",
            })
        );
    }

    #[test]
    fn connected_event_wire_shape() {
        let e = Event::Connected {
            user: "root".into(),
            host: "192.168.1.43".into(),
            method: AuthMethod::Key,
        };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(
            v,
            json!({"type": "connected", "user": "root", "host": "192.168.1.43", "method": "key"})
        );
    }

    #[test]
    fn unit_events_carry_only_type() {
        assert_eq!(
            serde_json::to_value(Event::KeysCopied).unwrap(),
            json!({"type": "keysCopied"})
        );
        assert_eq!(
            serde_json::to_value(Event::KeygenDone).unwrap(),
            json!({"type": "keygenDone"})
        );
    }

    #[test]
    fn file_append_parses_from_wire() {
        let e: Event = serde_json::from_str(
            r#"{"type":"fileAppend","target":"authorized_keys","content":"ssh-rsa AAA"}"#,
        )
        .unwrap();
        assert_eq!(
            e,
            Event::FileAppend {
                target: "authorized_keys".into(),
                content: "ssh-rsa AAA".into(),
            }
        );
    }

    #[test]
    fn kind_matches_serialized_tag() {
        let events = [
            Event::KeysCopied,
            Event::KeygenDone,
            Event::FileAppend {
                target: "t".into(),
                content: "c".into(),
            },
            Event::Connected {
                user: "u".into(),
                host: "h".into(),
                method: AuthMethod::Password,
            },
        ];
        for e in &events {
            let v = serde_json::to_value(e).unwrap();
            assert_eq!(v["type"], e.kind());
        }
    }

    #[test]
    fn auth_method_display() {
        assert_eq!(AuthMethod::Password.to_string(), "password");
        assert_eq!(AuthMethod::Key.to_string(), "key");
    }
}
