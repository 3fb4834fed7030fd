//! Command trait, registry, and the capability object handed to commands.

use std::collections::HashMap;

use termsim_types::config::LessonConfig;
use termsim_types::error::{Result, SimError};
use termsim_types::event::Event;
use termsim_types::transcript::{Style, TranscriptEntry};
use termsim_vfs::MemoryVfs;

use crate::dialogue::Dialogue;
use crate::session::Session;
use crate::terminal::EventBus;

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text; each `\n`-separated line becomes one transcript entry.
    Text(String),
    /// Command produced no visible output.
    None,
    /// Signal to empty the transcript.
    Clear,
}

/// Shared mutable environment passed to every command and dialogue.
///
/// Exposes the session, the VFS, the lesson configuration, transcript
/// output, event broadcast, and dialogue start.
pub struct Environment<'a> {
    /// The submitted line, trimmed. `echo` inspects it for `>>`.
    pub line: &'a str,
    pub session: &'a mut Session,
    pub vfs: &'a mut MemoryVfs,
    pub lesson: &'a LessonConfig,
    pub(crate) transcript: &'a mut Vec<TranscriptEntry>,
    pub(crate) bus: &'a mut EventBus,
    pub(crate) dialogue: &'a mut Option<Box<dyn Dialogue>>,
}

impl<'a> Environment<'a> {
    /// Assemble an environment from the pieces a simulation owns.
    pub fn new(
        line: &'a str,
        session: &'a mut Session,
        vfs: &'a mut MemoryVfs,
        lesson: &'a LessonConfig,
        transcript: &'a mut Vec<TranscriptEntry>,
        bus: &'a mut EventBus,
        dialogue: &'a mut Option<Box<dyn Dialogue>>,
    ) -> Self {
        Self {
            line,
            session,
            vfs,
            lesson,
            transcript,
            bus,
            dialogue,
        }
    }

    /// Append an output line.
    pub fn print(&mut self, text: impl Into<String>) {
        self.transcript.push(TranscriptEntry::output(text));
    }

    /// Append an output line with a rendering hint.
    pub fn print_styled(&mut self, text: impl Into<String>, style: Style) {
        self.transcript.push(TranscriptEntry::styled(text, style));
    }

    /// Broadcast an event to every listener.
    pub fn emit(&mut self, event: Event) {
        self.bus.emit(event);
    }

    /// Make `dialogue` receive the following input lines.
    pub fn start_dialogue(&mut self, dialogue: Box<dyn Dialogue>) -> Result<()> {
        if self.dialogue.is_some() {
            return Err(SimError::DialogueActive);
        }
        log::debug!("dialogue started: {}", dialogue.kind());
        *self.dialogue = Some(dialogue);
        Ok(())
    }

    pub fn dialogue_active(&self) -> bool {
        self.dialogue.is_some()
    }

    /// The lesson home directory.
    pub fn home(&self) -> &str {
        self.session.home()
    }
}

/// A single executable command.
pub trait Command {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Usage string (e.g. "cd \[path\]").
    fn usage(&self) -> &str;

    /// Command category for grouping in `help <command>` output.
    fn category(&self) -> &str {
        "general"
    }

    /// Execute the command with the given arguments and environment.
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput>;
}

/// A command backed by a closure, for lesson-specific commands.
pub struct FnCommand<F> {
    name: String,
    description: String,
    handler: F,
}

impl<F> FnCommand<F>
where
    F: Fn(&[&str], &mut Environment<'_>) -> Result<CommandOutput>,
{
    pub fn new(name: &str, description: &str, handler: F) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            description: description.to_string(),
            handler,
        }
    }
}

impl<F> Command for FnCommand<F>
where
    F: Fn(&[&str], &mut Environment<'_>) -> Result<CommandOutput>,
{
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn usage(&self) -> &str {
        &self.name
    }
    fn category(&self) -> &str {
        "lesson"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        (self.handler)(args, env)
    }
}

/// Registry of available commands.
///
/// Built-ins and custom (lesson-supplied) commands live in separate tables;
/// lookup consults the custom table first, so a custom command shadows the
/// built-in of the same name.
pub struct CommandRegistry {
    builtins: HashMap<String, Box<dyn Command>>,
    custom: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self {
            builtins: HashMap::new(),
            custom: HashMap::new(),
        }
    }

    /// Register a built-in. Replaces any existing built-in with the same name.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.builtins.insert(cmd.name().to_ascii_lowercase(), cmd);
    }

    /// Register a custom command, shadowing any built-in of the same name.
    pub fn register_custom(&mut self, cmd: Box<dyn Command>) {
        log::debug!("custom command registered: {}", cmd.name());
        self.custom.insert(cmd.name().to_ascii_lowercase(), cmd);
    }

    /// Register a closure as a custom command.
    pub fn register_fn<F>(&mut self, name: &str, description: &str, handler: F)
    where
        F: Fn(&[&str], &mut Environment<'_>) -> Result<CommandOutput> + 'static,
    {
        self.register_custom(Box::new(FnCommand::new(name, description, handler)));
    }

    /// Resolve a case-folded command name, custom entries first.
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.custom
            .get(name)
            .or_else(|| self.builtins.get(name))
            .map(|c| c.as_ref())
    }

    pub fn is_custom(&self, name: &str) -> bool {
        self.custom.contains_key(name)
    }

    /// Sorted (name, description) pairs of built-ins not shadowed by a
    /// custom command.
    pub fn list_builtins(&self) -> Vec<(&str, &str)> {
        let mut cmds: Vec<(&str, &str)> = self
            .builtins
            .iter()
            .filter(|(name, _)| !self.custom.contains_key(*name))
            .map(|(_, c)| (c.name(), c.description()))
            .collect();
        cmds.sort_by_key(|(name, _)| *name);
        cmds
    }

    /// Sorted (name, description) pairs of custom commands.
    pub fn list_custom(&self) -> Vec<(&str, &str)> {
        let mut cmds: Vec<(&str, &str)> = self
            .custom
            .values()
            .map(|c| (c.name(), c.description()))
            .collect();
        cmds.sort_by_key(|(name, _)| *name);
        cmds
    }

    /// Built-in help with access to the registry.
    pub(crate) fn execute_help(&self, args: &[&str]) -> Result<CommandOutput> {
        if let Some(&name) = args.first() {
            let name_lower = name.to_ascii_lowercase();
            if name_lower == "help" {
                return Ok(CommandOutput::Text(
                    "help (general)\n  List available commands\n  Usage: help [command]".into(),
                ));
            }
            return match self.get(&name_lower) {
                Some(cmd) => Ok(CommandOutput::Text(format!(
                    "{} ({})\n  {}\n  Usage: {}",
                    cmd.name(),
                    cmd.category(),
                    cmd.description(),
                    cmd.usage()
                ))),
                None => Err(SimError::Command(format!(
                    "help: no help topics match '{name}'"
                ))),
            };
        }

        let mut out = String::from("Available commands:\n");
        out.push_str(&format!("  {:12} {}\n", "help", "List available commands"));
        for (name, desc) in self.list_builtins() {
            out.push_str(&format!("  {name:12} {desc}\n"));
        }
        let custom = self.list_custom();
        if !custom.is_empty() {
            out.push_str("\nLesson commands:\n");
            for (name, desc) in custom {
                out.push_str(&format!("  {name:12} {desc}\n"));
            }
        }
        out.push_str("\nType 'help <command>' for details.");
        Ok(CommandOutput::Text(out))
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Split a `user@host` operand. Exactly one `@` with text on both sides.
pub(crate) fn parse_target(arg: &str) -> Option<(&str, &str)> {
    let (user, host) = arg.split_once('@')?;
    if user.is_empty() || host.is_empty() || host.contains('@') {
        return None;
    }
    Some((user, host))
}

/// The text after the command name, with inner spacing preserved.
pub(crate) fn strip_command_name(line: &str) -> &str {
    let line = line.trim_start();
    match line.find(char::is_whitespace) {
        Some(i) => line[i..].trim_start(),
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);
    impl Command for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "test command"
        }
        fn usage(&self) -> &str {
            self.0
        }
        fn execute(&self, _: &[&str], _: &mut Environment<'_>) -> Result<CommandOutput> {
            Ok(CommandOutput::Text(self.0.to_string()))
        }
    }

    #[test]
    fn custom_shadows_builtin() {
        let mut reg = CommandRegistry::new();
        reg.register(Box::new(Named("ls")));
        reg.register_fn("ls", "lesson ls", |_, _| {
            Ok(CommandOutput::Text("custom".into()))
        });
        assert!(reg.is_custom("ls"));
        assert_eq!(reg.get("ls").unwrap().description(), "lesson ls");
        assert!(reg.list_builtins().is_empty());
        assert_eq!(reg.list_custom(), vec![("ls", "lesson ls")]);
    }

    #[test]
    fn names_are_case_folded_on_register() {
        let mut reg = CommandRegistry::new();
        reg.register_fn("Sudo", "run as root", |_, _| Ok(CommandOutput::None));
        assert!(reg.get("sudo").is_some());
    }

    #[test]
    fn list_builtins_sorted() {
        let mut reg = CommandRegistry::new();
        reg.register(Box::new(Named("zebra")));
        reg.register(Box::new(Named("alpha")));
        reg.register(Box::new(Named("middle")));
        let cmds = reg.list_builtins();
        assert_eq!(cmds[0].0, "alpha");
        assert_eq!(cmds[1].0, "middle");
        assert_eq!(cmds[2].0, "zebra");
    }

    #[test]
    fn help_lists_builtins_and_custom() {
        let mut reg = CommandRegistry::new();
        reg.register(Box::new(Named("pwd")));
        reg.register_fn("systemctl", "control services", |_, _| {
            Ok(CommandOutput::None)
        });
        let CommandOutput::Text(out) = reg.execute_help(&[]).unwrap() else {
            panic!("expected text output");
        };
        assert!(out.contains("pwd"));
        assert!(out.contains("Lesson commands:"));
        assert!(out.contains("systemctl"));
    }

    #[test]
    fn help_for_single_command() {
        let mut reg = CommandRegistry::new();
        reg.register(Box::new(Named("pwd")));
        let CommandOutput::Text(out) = reg.execute_help(&["PWD"]).unwrap() else {
            panic!("expected text output");
        };
        assert!(out.starts_with("pwd (general)"));
        assert!(reg.execute_help(&["nope"]).is_err());
    }

    #[test]
    fn parse_target_forms() {
        assert_eq!(
            parse_target("alumno@192.168.1.43"),
            Some(("alumno", "192.168.1.43"))
        );
        assert_eq!(parse_target("192.168.1.43"), None);
        assert_eq!(parse_target("@host"), None);
        assert_eq!(parse_target("user@"), None);
        assert_eq!(parse_target("a@b@c"), None);
    }

    #[test]
    fn strip_command_name_keeps_inner_spacing() {
        assert_eq!(strip_command_name("echo   hola  mundo"), "hola  mundo");
        assert_eq!(strip_command_name("echo"), "");
    }
}
