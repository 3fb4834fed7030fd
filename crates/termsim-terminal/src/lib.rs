//! Command interpreter and terminal simulation engine.
//!
//! The terminal is a registry-based dispatch system. Commands implement the
//! `Command` trait and are registered by name; lesson code may register
//! custom commands that shadow the built-ins. While an interactive prompt
//! (`Dialogue`) is active, every submitted line goes to it instead of the
//! registry. Every accepted line and notable state change is broadcast as a
//! typed `Event` for lesson-progress tracking.

mod commands;
pub mod dialogue;
mod interpreter;
pub mod missions;
pub mod network_commands;
mod session;
mod terminal;

/// Register the built-in file and session commands into a registry.
pub use commands::register_builtins;
/// How `echo` splits a line into printed text or an append request.
pub use commands::{EchoAction, parse_echo};
/// Multi-turn interactive prompt trait and its step result.
pub use dialogue::{Dialogue, DialogueStep};
/// A single executable command trait.
pub use interpreter::Command;
/// Output produced by a command (text, clear signal).
pub use interpreter::CommandOutput;
/// Registry of built-in and custom commands.
pub use interpreter::CommandRegistry;
/// Capability object passed to every command and dialogue.
pub use interpreter::Environment;
/// Adapter turning a closure into a command.
pub use interpreter::FnCommand;
/// Lesson progress tracking over broadcast events.
pub use missions::{Mission, MissionBoard};
/// Register the simulated ssh, ssh-keygen and ssh-copy-id commands.
pub use network_commands::register_network_commands;
/// Optional `echo` that installs keys appended to `authorized_keys`.
pub use network_commands::{AuthorizedKeysEcho, register_authorized_keys_echo};
/// Identity, working directory and key/host trust of one simulation.
pub use session::Session;
/// The simulation instance and its event bus.
pub use terminal::{EventBus, Terminal};

pub use termsim_types::config::LessonConfig;
pub use termsim_types::error::{Result, SimError};
pub use termsim_types::event::{AuthMethod, Event};
pub use termsim_types::transcript::{Role, Style, TranscriptEntry};
pub use termsim_vfs::MemoryVfs;
