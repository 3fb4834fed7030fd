//! Identity, working directory and trust state of one simulation.

use std::collections::BTreeSet;

use termsim_types::config::LessonConfig;
use termsim_types::event::AuthMethod;

/// Session state threaded through every command.
///
/// `cwd` always names an existing directory. The identity is either the
/// local one from the lesson configuration or a remote one assumed after a
/// simulated login; `disconnect` is the only way back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: String,
    pub host: String,
    pub cwd: String,
    /// Set while a masked prompt is waiting. Only the UI reads it.
    pub password_mode: bool,
    local_user: String,
    local_host: String,
    home: String,
    known_hosts: BTreeSet<String>,
    authorized: BTreeSet<(String, String)>,
}

impl Session {
    /// A fresh local session starting in the lesson home.
    pub fn new(lesson: &LessonConfig) -> Self {
        Self {
            user: lesson.user.clone(),
            host: lesson.host.clone(),
            cwd: lesson.home.clone(),
            password_mode: false,
            local_user: lesson.user.clone(),
            local_host: lesson.host.clone(),
            home: lesson.home.clone(),
            known_hosts: BTreeSet::new(),
            authorized: BTreeSet::new(),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.host != self.local_host
    }

    /// Assume a remote identity. The working directory is kept.
    pub fn connect(&mut self, user: &str, host: &str, method: AuthMethod) {
        log::info!("connected as {user}@{host} via {method}");
        self.user = user.to_string();
        self.host = host.to_string();
    }

    /// Return to the local identity.
    pub fn disconnect(&mut self) {
        log::info!("connection to {} closed", self.host);
        self.user.clone_from(&self.local_user);
        self.host.clone_from(&self.local_host);
    }

    /// Record that `user@host` accepts the local public key.
    pub fn authorize(&mut self, user: &str, host: &str) {
        if self
            .authorized
            .insert((user.to_string(), host.to_string()))
        {
            log::info!("public key installed for {user}@{host}");
        }
    }

    pub fn is_authorized(&self, user: &str, host: &str) -> bool {
        self.authorized
            .contains(&(user.to_string(), host.to_string()))
    }

    pub fn trust_host(&mut self, host: &str) {
        self.known_hosts.insert(host.to_string());
    }

    pub fn knows_host(&self, host: &str) -> bool {
        self.known_hosts.contains(host)
    }

    pub fn home(&self) -> &str {
        &self.home
    }

    /// The working directory with the home prefix shown as `~`.
    pub fn display_path(&self) -> String {
        if self.cwd == self.home {
            return "~".to_string();
        }
        match self.cwd.strip_prefix(self.home.as_str()) {
            Some(rest) if rest.starts_with('/') => format!("~{rest}"),
            _ => self.cwd.clone(),
        }
    }

    /// Shell prompt for the current identity, e.g. `alumno@laptop-local:~$`.
    pub fn prompt(&self) -> String {
        format!("{}@{}:{}$", self.user, self.host, self.display_path())
    }
}
