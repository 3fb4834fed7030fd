//! Simulated network commands: ssh, ssh-keygen, ssh-copy-id.
//!
//! Nothing here touches a socket. Each command validates its operand
//! against the single lesson target and, when a secret or confirmation is
//! needed, starts a [`Dialogue`](crate::Dialogue) that finishes the job on
//! the next submitted line.

use termsim_types::error::{Result, SimError};
use termsim_types::event::{AuthMethod, Event};
use termsim_types::transcript::Style;
use termsim_vfs::{MemoryVfs, join};

use crate::commands::{EchoAction, parse_echo};
use crate::dialogue::{HostKeyPrompt, KeygenWizard, PasswordPrompt};
use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment, parse_target};

/// Register ssh, ssh-keygen and ssh-copy-id.
pub fn register_network_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(SshCmd));
    reg.register(Box::new(SshKeygenCmd));
    reg.register(Box::new(SshCopyIdCmd));
}

/// Install the authorized-keys aware `echo` as a custom command.
pub fn register_authorized_keys_echo(reg: &mut CommandRegistry) {
    reg.register_custom(Box::new(AuthorizedKeysEcho));
}

/// Print the login banner, switch identity and announce the connection.
pub(crate) fn finish_login(env: &mut Environment<'_>, user: &str, host: &str, method: AuthMethod) {
    let lesson = env.lesson;
    for line in &lesson.login_banner {
        env.print_styled(line.as_str(), Style::Banner);
    }
    env.print(format!(
        "Last login: Tue Oct  3 10:12:45 2023 from {}",
        lesson.target.client_address
    ));
    env.session.connect(user, host, method);
    env.emit(Event::Connected {
        user: user.to_string(),
        host: host.to_string(),
        method,
    });
}

/// Operands shared by ssh and ssh-copy-id.
#[derive(Debug, Default, PartialEq, Eq)]
struct SshArgs<'a> {
    target: Option<&'a str>,
    port: Option<u16>,
}

fn parse_port(raw: &str) -> Result<u16> {
    match raw.parse::<u16>() {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(SimError::Command(format!("Bad port '{raw}'"))),
    }
}

/// Accepts `-p N`, `-pN` and the target operand; other flags are ignored.
fn parse_ssh_args<'a>(cmd: &str, args: &[&'a str]) -> Result<SshArgs<'a>> {
    let mut out = SshArgs::default();
    let mut iter = args.iter();
    while let Some(&arg) = iter.next() {
        if arg == "-p" {
            let Some(&raw) = iter.next() else {
                return Err(SimError::Command(format!(
                    "{cmd}: option requires an argument -- p"
                )));
            };
            out.port = Some(parse_port(raw)?);
        } else if let Some(raw) = arg.strip_prefix("-p") {
            out.port = Some(parse_port(raw)?);
        } else if arg.starts_with('-') {
            log::debug!("{cmd}: ignoring flag {arg}");
        } else if out.target.is_none() {
            out.target = Some(arg);
        }
    }
    Ok(out)
}

/// Why an operand does not reach the lesson target.
enum Unreachable {
    BadFormat,
    TimedOut { host: String, port: u16 },
    Refused { host: String, port: u16 },
}

impl Unreachable {
    fn message(&self, operand: &str) -> String {
        match self {
            Self::BadFormat => {
                format!("ssh: Could not resolve hostname {operand}: Name or service not known")
            },
            Self::TimedOut { host, port } => {
                format!("ssh: connect to host {host} port {port}: Connection timed out")
            },
            Self::Refused { host, port } => {
                format!("ssh: connect to host {host} port {port}: Connection refused")
            },
        }
    }
}

/// Check a `user@host` operand and port against the lesson target.
fn reach_target<'a>(
    env: &Environment<'_>,
    operand: &'a str,
    port: Option<u16>,
) -> std::result::Result<(&'a str, &'a str), Unreachable> {
    let (user, host) = parse_target(operand).ok_or(Unreachable::BadFormat)?;
    let target = &env.lesson.target;
    let port = port.unwrap_or(22);
    if host != target.host {
        return Err(Unreachable::TimedOut {
            host: host.to_string(),
            port,
        });
    }
    if port != target.port {
        return Err(Unreachable::Refused {
            host: host.to_string(),
            port,
        });
    }
    Ok((user, host))
}

/// Name of the first complete key pair under `<home>/.ssh`, as the public
/// key's file name.
fn find_public_key(vfs: &MemoryVfs, home: &str) -> Option<String> {
    let ssh_dir = join(home, ".ssh");
    let children = vfs.children(&ssh_dir).ok()?;
    children
        .iter()
        .filter_map(|name| Some((name, name.strip_suffix(".pub")?)))
        .find(|(public, private)| {
            vfs.is_file(&join(&ssh_dir, public)) && vfs.is_file(&join(&ssh_dir, private))
        })
        .map(|(public, _)| public.clone())
}

// ---------------------------------------------------------------------------
// ssh
// ---------------------------------------------------------------------------

struct SshCmd;
impl Command for SshCmd {
    fn name(&self) -> &str {
        "ssh"
    }
    fn description(&self) -> &str {
        "Log into the lesson host"
    }
    fn usage(&self) -> &str {
        "ssh [-p port] user@host"
    }
    fn category(&self) -> &str {
        "network"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let parsed = parse_ssh_args("ssh", args)?;
        let Some(operand) = parsed.target else {
            return Err(SimError::Command(
                "usage: ssh [-p port] user@host".to_string(),
            ));
        };
        let (user, host) =
            reach_target(env, operand, parsed.port).map_err(|e| SimError::Command(e.message(operand)))?;

        if env.session.is_authorized(user, host) {
            env.print("Authenticated using public key.");
            finish_login(env, user, host, AuthMethod::Key);
            return Ok(CommandOutput::None);
        }

        if env.lesson.target.confirm_host_key && !env.session.knows_host(host) {
            env.print_styled(
                format!("The authenticity of host '{host} ({host})' can't be established."),
                Style::Warning,
            );
            env.print_styled(
                format!(
                    "ECDSA key fingerprint is {}.",
                    env.lesson.target.host_key_fingerprint
                ),
                Style::Warning,
            );
            env.print_styled(
                "Are you sure you want to continue connecting (yes/no/[fingerprint])?",
                Style::Prompt,
            );
            env.start_dialogue(Box::new(HostKeyPrompt::new(user, host)))?;
            return Ok(CommandOutput::None);
        }

        env.print_styled(format!("{user}@{host}'s password:"), Style::Prompt);
        env.start_dialogue(Box::new(PasswordPrompt::login(user, host)))?;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// ssh-keygen
// ---------------------------------------------------------------------------

struct SshKeygenCmd;
impl Command for SshKeygenCmd {
    fn name(&self) -> &str {
        "ssh-keygen"
    }
    fn description(&self) -> &str {
        "Generate a key pair under ~/.ssh"
    }
    fn usage(&self) -> &str {
        "ssh-keygen [-t rsa|ed25519|ecdsa]"
    }
    fn category(&self) -> &str {
        "network"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let mut algorithm = "rsa";
        let mut iter = args.iter();
        while let Some(&arg) = iter.next() {
            if arg == "-t" {
                let Some(&kind) = iter.next() else {
                    return Err(SimError::Command(
                        "ssh-keygen: option requires an argument -- t".to_string(),
                    ));
                };
                algorithm = kind;
            }
        }
        if !matches!(algorithm, "rsa" | "ed25519" | "ecdsa") {
            return Err(SimError::Command(format!(
                "unknown key type {algorithm}"
            )));
        }
        if env.dialogue_active() {
            return Err(SimError::DialogueActive);
        }
        let wizard = KeygenWizard::new(algorithm);
        let default = wizard.default_path(env.home());
        env.print(format!("Generating public/private {algorithm} key pair."));
        env.print_styled(
            format!("Enter file in which to save the key ({default}):"),
            Style::Prompt,
        );
        env.start_dialogue(Box::new(wizard))?;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// ssh-copy-id
// ---------------------------------------------------------------------------

struct SshCopyIdCmd;
impl Command for SshCopyIdCmd {
    fn name(&self) -> &str {
        "ssh-copy-id"
    }
    fn description(&self) -> &str {
        "Install your public key on the lesson host"
    }
    fn usage(&self) -> &str {
        "ssh-copy-id [-p port] user@host"
    }
    fn category(&self) -> &str {
        "network"
    }
    fn execute(&self, args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let Some(public_key) = find_public_key(env.vfs, env.home()) else {
            return Err(SimError::Command(
                "ERROR: No identity found. Run 'ssh-keygen' first to generate your keys."
                    .to_string(),
            ));
        };
        let parsed = parse_ssh_args("ssh-copy-id", args)?;
        let Some(operand) = parsed.target else {
            return Err(SimError::Command(
                "usage: ssh-copy-id [-p port] user@host".to_string(),
            ));
        };
        let (user, host) = reach_target(env, operand, parsed.port).map_err(|e| {
            SimError::Command(format!("/usr/bin/ssh-copy-id: ERROR: {}", e.message(operand)))
        })?;

        let source = join(&join(env.home(), ".ssh"), &public_key);
        env.print(format!(
            "/usr/bin/ssh-copy-id: INFO: Source of key(s) to be installed: \"{source}\""
        ));
        if env.session.is_authorized(user, host) {
            env.print_styled(
                "/usr/bin/ssh-copy-id: WARNING: All keys were skipped because they already exist on the remote system.",
                Style::Warning,
            );
            return Ok(CommandOutput::None);
        }
        env.print_styled(format!("{user}@{host}'s password:"), Style::Prompt);
        env.start_dialogue(Box::new(PasswordPrompt::copy_id(user, host)))?;
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// echo >> authorized_keys
// ---------------------------------------------------------------------------

/// `echo` that treats an append to `authorized_keys` as installing the key
/// for the current identity. Lessons that teach manual key installation
/// register it over the built-in.
pub struct AuthorizedKeysEcho;
impl Command for AuthorizedKeysEcho {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Print text, or append it to a file with >> (installs authorized keys)"
    }
    fn usage(&self) -> &str {
        "echo <text> [>> ~/.ssh/authorized_keys]"
    }
    fn category(&self) -> &str {
        "lesson"
    }
    fn execute(&self, _args: &[&str], env: &mut Environment<'_>) -> Result<CommandOutput> {
        let (content, target) = match parse_echo(env.line)? {
            EchoAction::Print(text) => return Ok(CommandOutput::Text(text)),
            EchoAction::Append { content, target } => (content, target),
        };
        let installs_key = target.contains("authorized_keys");
        let long_enough = content.chars().count() > 10;
        env.emit(Event::FileAppend { target, content });
        if !installs_key {
            return Ok(CommandOutput::None);
        }
        if !long_enough {
            return Err(SimError::Command("echo: key seems too short".to_string()));
        }
        let user = env.session.user.clone();
        let host = env.session.host.clone();
        env.session.authorize(&user, &host);
        env.emit(Event::KeysCopied);
        Ok(CommandOutput::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssh_args_with_separate_port() {
        let parsed = parse_ssh_args("ssh", &["root@192.168.1.43", "-p", "1234"]).unwrap();
        assert_eq!(parsed.target, Some("root@192.168.1.43"));
        assert_eq!(parsed.port, Some(1234));
    }

    #[test]
    fn ssh_args_with_attached_port_and_flags() {
        let parsed = parse_ssh_args("ssh", &["-v", "-p2222", "a@b"]).unwrap();
        assert_eq!(parsed.target, Some("a@b"));
        assert_eq!(parsed.port, Some(2222));
    }

    #[test]
    fn ssh_args_bad_port() {
        let err = parse_ssh_args("ssh", &["a@b", "-p", "abc"]).unwrap_err();
        assert_eq!(err.to_string(), "Bad port 'abc'");
        let err = parse_ssh_args("ssh", &["a@b", "-p", "0"]).unwrap_err();
        assert_eq!(err.to_string(), "Bad port '0'");
    }

    #[test]
    fn ssh_args_missing_port_value() {
        let err = parse_ssh_args("ssh", &["a@b", "-p"]).unwrap_err();
        assert_eq!(err.to_string(), "ssh: option requires an argument -- p");
    }

    #[test]
    fn find_public_key_needs_both_halves() {
        use termsim_types::config::LessonConfig;
        let mut vfs = MemoryVfs::from_snapshot(&LessonConfig::default().filesystem).unwrap();
        assert_eq!(find_public_key(&vfs, "/home/alumno"), None);
        vfs.ensure_dir("/home/alumno/.ssh").unwrap();
        vfs.write("/home/alumno/.ssh/id_rsa.pub", "ssh-rsa AAAA").unwrap();
        assert_eq!(find_public_key(&vfs, "/home/alumno"), None);
        vfs.write("/home/alumno/.ssh/id_rsa", "PRIVATE").unwrap();
        assert_eq!(
            find_public_key(&vfs, "/home/alumno").as_deref(),
            Some("id_rsa.pub")
        );
    }
}
