//! Built-in file and session commands.

use termsim_types::error::{Result, SimError};
use termsim_types::event::Event;
use termsim_types::node::Node;
use termsim_vfs::{join, parent, resolve_path};

use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment, strip_command_name};

/// Register all built-in commands into a registry.
///
/// `help` is not registered here; the terminal answers it from the
/// registry itself.
pub fn register_builtins(reg: &mut CommandRegistry) {
    reg.register(Box::new(LsCmd));
    reg.register(Box::new(CdCmd));
    reg.register(Box::new(PwdCmd));
    reg.register(Box::new(WhoamiCmd));
    reg.register(Box::new(CatCmd));
    reg.register(Box::new(MkdirCmd));
    reg.register(Box::new(TouchCmd));
    reg.register(Box::new(MvCmd));
    reg.register(Box::new(EchoCmd));
    reg.register(Box::new(ClearCmd));
    reg.register(Box::new(ExitCmd));
}

fn diag(msg: impl Into<String>) -> SimError {
    SimError::Command(msg.into())
}

// ---------------------------------------------------------------------------
// ls
// ---------------------------------------------------------------------------

struct LsCmd;
impl Command for LsCmd {
    fn name(&self) -> &str {
        "ls"
    }
    fn description(&self) -> &str {
        "List directory contents"
    }
    fn usage(&self) -> &str {
        "ls [-a]"
    }
    fn category(&self) -> &str {
        "file"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let show_hidden = args.iter().any(|a| a.starts_with('-') && a.contains('a'));
        let cwd = &env.session.cwd;
        let Ok(children) = env.vfs.children(cwd) else {
            return Err(diag(format!(
                "ls: cannot access '{cwd}': No such file or directory"
            )));
        };
        let visible: Vec<&str> = children
            .iter()
            .map(String::as_str)
            .filter(|name| show_hidden || !name.starts_with('.'))
            .collect();
        if visible.is_empty() {
            return Ok(CommandOutput::None);
        }
        Ok(CommandOutput::Text(visible.join("  ")))
    }
}

// ---------------------------------------------------------------------------
// cd
// ---------------------------------------------------------------------------

struct CdCmd;
impl Command for CdCmd {
    fn name(&self) -> &str {
        "cd"
    }
    fn description(&self) -> &str {
        "Change working directory"
    }
    fn usage(&self) -> &str {
        "cd [path|..]"
    }
    fn category(&self) -> &str {
        "file"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let Some(&arg) = args.first() else {
            let home = env.home().to_string();
            if !env.vfs.is_dir(&home) {
                return Err(diag(format!("bash: cd: {home}: No such file or directory")));
            }
            env.session.cwd = home;
            return Ok(CommandOutput::None);
        };
        if arg == ".." {
            // One-segment paths such as `/home` stay put.
            let depth = env.session.cwd.split('/').filter(|s| !s.is_empty()).count();
            if depth > 1 {
                env.session.cwd = parent(&env.session.cwd).to_string();
            }
            return Ok(CommandOutput::None);
        }
        let target = resolve_path(&env.session.cwd, arg);
        if !env.vfs.is_dir(&target) {
            return Err(diag(format!(
                "bash: cd: {arg}: No such file or directory"
            )));
        }
        env.session.cwd = target;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// pwd / whoami
// ---------------------------------------------------------------------------

struct PwdCmd;
impl Command for PwdCmd {
    fn name(&self) -> &str {
        "pwd"
    }
    fn description(&self) -> &str {
        "Print working directory"
    }
    fn usage(&self) -> &str {
        "pwd"
    }
    fn category(&self) -> &str {
        "file"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(env.session.cwd.clone()))
    }
}

struct WhoamiCmd;
impl Command for WhoamiCmd {
    fn name(&self) -> &str {
        "whoami"
    }
    fn description(&self) -> &str {
        "Print the current user name"
    }
    fn usage(&self) -> &str {
        "whoami"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Text(env.session.user.clone()))
    }
}

// ---------------------------------------------------------------------------
// cat
// ---------------------------------------------------------------------------

struct CatCmd;
impl Command for CatCmd {
    fn name(&self) -> &str {
        "cat"
    }
    fn description(&self) -> &str {
        "Display file contents"
    }
    fn usage(&self) -> &str {
        "cat <path>"
    }
    fn category(&self) -> &str {
        "file"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let Some(&arg) = args.first() else {
            return Err(diag("cat: missing operand"));
        };
        let path = resolve_path(&env.session.cwd, arg);
        match env.vfs.get(&path) {
            Some(Node::File { content }) => Ok(CommandOutput::Text(content.clone())),
            _ => Err(diag(format!("cat: {arg}: No such file or directory"))),
        }
    }
}

// ---------------------------------------------------------------------------
// mkdir
// ---------------------------------------------------------------------------

struct MkdirCmd;
impl Command for MkdirCmd {
    fn name(&self) -> &str {
        "mkdir"
    }
    fn description(&self) -> &str {
        "Create a directory in the current directory"
    }
    fn usage(&self) -> &str {
        "mkdir <name>"
    }
    fn category(&self) -> &str {
        "file"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let Some(&name) = args.first() else {
            return Err(diag("mkdir: missing operand"));
        };
        if name.contains('/') || name.contains("..") {
            return Err(diag("mkdir: complex paths not supported in this lesson"));
        }
        let path = join(&env.session.cwd, name);
        if name == "." || env.vfs.exists(&path) {
            return Err(diag(format!(
                "mkdir: cannot create directory '{name}': File exists"
            )));
        }
        env.vfs.mkdir(&path)?;
        log::debug!("mkdir {path}");
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// touch
// ---------------------------------------------------------------------------

struct TouchCmd;
impl Command for TouchCmd {
    fn name(&self) -> &str {
        "touch"
    }
    fn description(&self) -> &str {
        "Create an empty file if it does not exist"
    }
    fn usage(&self) -> &str {
        "touch <path>"
    }
    fn category(&self) -> &str {
        "file"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let Some(&arg) = args.first() else {
            return Err(diag("touch: missing file operand"));
        };
        let path = resolve_path(&env.session.cwd, arg);
        if path == "/" || !env.vfs.is_dir(parent(&path)) {
            return Err(diag(format!(
                "touch: cannot touch '{arg}': No such file or directory"
            )));
        }
        env.vfs.touch(&path)?;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// mv
// ---------------------------------------------------------------------------

struct MvCmd;
impl Command for MvCmd {
    fn name(&self) -> &str {
        "mv"
    }
    fn description(&self) -> &str {
        "Rename an entry or move it into a directory"
    }
    fn usage(&self) -> &str {
        "mv <src> <dest>"
    }
    fn category(&self) -> &str {
        "file"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let [src, dest, ..] = args else {
            return Err(diag("mv: missing source or destination"));
        };
        let cwd = env.session.cwd.clone();
        if !env.vfs.children(&cwd)?.iter().any(|c| c == src) {
            return Err(diag(format!(
                "mv: cannot stat '{src}': No such file or directory"
            )));
        }
        let from = join(&cwd, src);
        let home = env.home();
        if home == from || home.starts_with(&format!("{from}/")) {
            return Err(diag(format!(
                "mv: cannot move '{src}': Device or resource busy"
            )));
        }
        let dest_path = resolve_path(&cwd, dest);

        if env.vfs.is_dir(&dest_path) {
            let to = join(&dest_path, src);
            let shown = format!("{}/{src}", dest.trim_end_matches('/'));
            if to == from {
                return Err(diag(format!(
                    "mv: '{src}' and '{shown}' are the same file"
                )));
            }
            if dest_path == from || dest_path.starts_with(&format!("{from}/")) {
                return Err(diag(format!(
                    "mv: cannot move '{src}' to a subdirectory of itself, '{shown}'"
                )));
            }
            if env.vfs.exists(&to) {
                return Err(diag(format!(
                    "mv: cannot move '{src}' to '{shown}': File exists"
                )));
            }
            env.vfs.rename(&from, &to)?;
            log::debug!("mv {from} -> {to}");
            return Ok(CommandOutput::None);
        }

        if parent(&dest_path) != cwd {
            return Err(diag(format!(
                "mv: cannot move '{src}' to '{dest}': No such file or directory"
            )));
        }
        if env.vfs.exists(&dest_path) {
            return Err(diag(format!(
                "mv: cannot move '{src}' to '{dest}': File exists"
            )));
        }
        env.vfs.rename(&from, &dest_path)?;
        log::debug!("mv {from} -> {dest_path}");
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// echo
// ---------------------------------------------------------------------------

/// What an `echo` line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EchoAction {
    /// Print the text.
    Print(String),
    /// `echo content >> target`.
    Append { content: String, target: String },
}

/// Parse a full `echo` line. Quote characters are removed from the text,
/// and `>>` is found by substring search rather than tokenization.
pub fn parse_echo(line: &str) -> Result<EchoAction> {
    let rest = strip_command_name(line);
    let unquote = |s: &str| s.replace(['"', '\''], "").trim().to_string();
    match rest.split_once(">>") {
        Some((content, target)) => {
            let target = target.trim();
            if target.is_empty() {
                return Err(diag("bash: syntax error near unexpected token `newline'"));
            }
            Ok(EchoAction::Append {
                content: unquote(content),
                target: target.to_string(),
            })
        },
        None => Ok(EchoAction::Print(unquote(rest))),
    }
}

struct EchoCmd;
impl Command for EchoCmd {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Print text, or append it to a file with >>"
    }
    fn usage(&self) -> &str {
        "echo <text> [>> target]"
    }
    fn category(&self) -> &str {
        "text"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        match parse_echo(env.line)? {
            EchoAction::Print(text) => Ok(CommandOutput::Text(text)),
            EchoAction::Append { content, target } => {
                env.emit(Event::FileAppend { target, content });
                Ok(CommandOutput::None)
            },
        }
    }
}

// ---------------------------------------------------------------------------
// clear / exit
// ---------------------------------------------------------------------------

struct ClearCmd;
impl Command for ClearCmd {
    fn name(&self) -> &str {
        "clear"
    }
    fn description(&self) -> &str {
        "Clear the terminal"
    }
    fn usage(&self) -> &str {
        "clear"
    }
    fn execute(&self, _args: &[&str], _env: &mut Environment<'_>) -> Result<CommandOutput> {
        Ok(CommandOutput::Clear)
    }
}

struct ExitCmd;
impl Command for ExitCmd {
    fn name(&self) -> &str {
        "exit"
    }
    fn description(&self) -> &str {
        "Close the remote session"
    }
    fn usage(&self) -> &str {
        "exit"
    }
    fn category(&self) -> &str {
        "network"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        if !env.session.is_remote() {
            return Ok(CommandOutput::Text("Logout.".to_string()));
        }
        let msg = format!("Connection to {} closed.", env.session.host);
        env.session.disconnect();
        Ok(CommandOutput::Text(msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_plain_strips_quotes() {
        assert_eq!(
            parse_echo("echo \"hi\"").unwrap(),
            EchoAction::Print("hi".into())
        );
        assert_eq!(
            parse_echo("echo it's   fine").unwrap(),
            EchoAction::Print("its   fine".into())
        );
        assert_eq!(parse_echo("echo").unwrap(), EchoAction::Print(String::new()));
    }

    #[test]
    fn echo_append_splits_on_operator() {
        assert_eq!(
            parse_echo("echo \"ssh-rsa AAAA==\" >> authorized_keys").unwrap(),
            EchoAction::Append {
                content: "ssh-rsa AAAA==".into(),
                target: "authorized_keys".into(),
            }
        );
        assert_eq!(
            parse_echo("echo x>>~/.ssh/authorized_keys").unwrap(),
            EchoAction::Append {
                content: "x".into(),
                target: "~/.ssh/authorized_keys".into(),
            }
        );
    }

    #[test]
    fn echo_append_without_target_is_a_syntax_error() {
        let err = parse_echo("echo hola >>").unwrap_err();
        assert_eq!(
            err.to_string(),
            "bash: syntax error near unexpected token `newline'"
        );
    }
}
