//! Lesson configuration loaded from TOML.
//!
//! A lesson supplies the starting filesystem, the local identity, the
//! single remote target learners connect to, and the credentials that
//! target accepts. Every field has a default matching the introductory
//! SSH lesson, so an empty document is a valid configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::criterion::Criterion;
use crate::error::{Result, SimError};
use crate::node::Node;

/// Full configuration of one simulation instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonConfig {
    /// Local user name.
    #[serde(default = "default_user")]
    pub user: String,
    /// Local host name.
    #[serde(default = "default_host")]
    pub host: String,
    /// Home directory; also the starting working directory.
    #[serde(default = "default_home")]
    pub home: String,
    /// Welcome line. `{user}` and `{host}` are substituted; empty disables it.
    #[serde(default = "default_motd")]
    pub motd: String,
    /// Lines printed after every successful login.
    #[serde(default = "default_login_banner")]
    pub login_banner: Vec<String>,
    #[serde(default)]
    pub target: TargetConfig,
    /// Initial VFS snapshot, absolute path -> node.
    #[serde(default = "default_filesystem")]
    pub filesystem: BTreeMap<String, Node>,
    #[serde(default)]
    pub missions: Vec<MissionSpec>,
}

fn default_user() -> String {
    "alumno".to_string()
}
fn default_host() -> String {
    "laptop-local".to_string()
}
fn default_home() -> String {
    "/home/alumno".to_string()
}
fn default_motd() -> String {
    "Welcome to {host}. Type 'help' if you get lost.".to_string()
}
fn default_login_banner() -> Vec<String> {
    vec![
        String::new(),
        "Welcome to Ubuntu 22.04.3 LTS (GNU/Linux 5.15.0-91-generic x86_64)".to_string(),
        " * Documentation:  https://help.ubuntu.com".to_string(),
    ]
}
fn default_filesystem() -> BTreeMap<String, Node> {
    let mut fs = BTreeMap::new();
    fs.insert(
        "/home/alumno".to_string(),
        Node::Dir {
            children: vec!["notas.txt".to_string()],
        },
    );
    fs.insert(
        "/home/alumno/notas.txt".to_string(),
        Node::file("Apuntes secretos de la clase de SSH."),
    );
    fs.insert("/home/teacher".to_string(), Node::empty_dir());
    fs
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
            host: default_host(),
            home: default_home(),
            motd: default_motd(),
            login_banner: default_login_banner(),
            target: TargetConfig::default(),
            filesystem: default_filesystem(),
            missions: Vec::new(),
        }
    }
}

impl LessonConfig {
    /// Parse and validate a lesson from a TOML document.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Check identity fields. The filesystem snapshot is checked by the VFS
    /// when it is loaded.
    pub fn validate(&self) -> Result<()> {
        if self.user.is_empty() || self.host.is_empty() {
            log::warn!("rejecting lesson config with empty identity");
            return Err(SimError::Config("user and host must not be empty".into()));
        }
        if !self.home.starts_with('/') {
            log::warn!("rejecting lesson config with relative home {}", self.home);
            return Err(SimError::Config(format!(
                "home must be an absolute path: {}",
                self.home
            )));
        }
        if self.target.host.is_empty() {
            return Err(SimError::Config("target host must not be empty".into()));
        }
        if self.target.port == 0 {
            return Err(SimError::Config("target port must be non-zero".into()));
        }
        Ok(())
    }

    /// The welcome line with placeholders substituted, if any.
    pub fn motd_line(&self) -> Option<String> {
        if self.motd.is_empty() {
            return None;
        }
        Some(
            self.motd
                .replace("{host}", &self.host)
                .replace("{user}", &self.user),
        )
    }
}

/// The single remote host a lesson accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_target_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Accepted logins. Empty accepts any user and any secret.
    #[serde(default = "default_accounts")]
    pub accounts: Vec<Account>,
    /// Let `ssh` password logins through for users missing from `accounts`.
    /// `ssh-copy-id` always requires a listed account.
    #[serde(default = "yes")]
    pub open_login: bool,
    #[serde(default = "default_fingerprint")]
    pub host_key_fingerprint: String,
    /// Ask the authenticity question before the first password login.
    #[serde(default = "yes")]
    pub confirm_host_key: bool,
    /// Address shown in the "Last login" banner line.
    #[serde(default = "default_client_address")]
    pub client_address: String,
}

fn default_target_host() -> String {
    "192.168.1.43".to_string()
}
fn default_port() -> u16 {
    22
}
fn default_accounts() -> Vec<Account> {
    vec![
        Account {
            user: "alumno".to_string(),
            password: None,
        },
        Account {
            user: "alumno-saiyan".to_string(),
            password: None,
        },
    ]
}
fn default_fingerprint() -> String {
    "SHA256:Kp3...5zE".to_string()
}
fn yes() -> bool {
    true
}
fn default_client_address() -> String {
    "192.168.1.10".to_string()
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: default_target_host(),
            port: default_port(),
            accounts: default_accounts(),
            open_login: true,
            host_key_fingerprint: default_fingerprint(),
            confirm_host_key: true,
            client_address: default_client_address(),
        }
    }
}

impl TargetConfig {
    /// Whether `secret` opens an `ssh` session for `user`. Listed accounts
    /// keep their password; other users depend on `open_login`.
    pub fn verify_login(&self, user: &str, secret: &str) -> bool {
        if self.accounts.iter().any(|a| a.user == user) {
            return self.verify_password(user, secret);
        }
        self.open_login || self.accounts.is_empty()
    }

    /// Whether `secret` authenticates `user` against the account list.
    pub fn verify_password(&self, user: &str, secret: &str) -> bool {
        if self.accounts.is_empty() {
            return true;
        }
        self.accounts
            .iter()
            .find(|a| a.user == user)
            .is_some_and(|a| a.password.as_deref().is_none_or(|p| p == secret))
    }
}

/// One accepted login on the lesson target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub user: String,
    /// Required secret; absent accepts any secret.
    #[serde(default)]
    pub password: Option<String>,
}

/// A lesson mission as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionSpec {
    pub id: String,
    pub text: String,
    pub criterion: Criterion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let c = LessonConfig::from_toml_str("").unwrap();
        assert_eq!(c.user, "alumno");
        assert_eq!(c.host, "laptop-local");
        assert_eq!(c.home, "/home/alumno");
        assert_eq!(c.target.host, "192.168.1.43");
        assert_eq!(c.target.port, 22);
        assert!(c.target.confirm_host_key);
        assert!(c.filesystem.contains_key("/home/alumno/notas.txt"));
    }

    #[test]
    fn parses_full_lesson() {
        let toml_str = r#"
user = "alumno-saiyan"
host = "host"
home = "/home/alumno-saiyan"
motd = ""

[target]
host = "192.168.1.43"
port = 1234
accounts = [{ user = "root", password = "1234" }]

[filesystem."/home/alumno-saiyan"]
type = "dir"
children = []

[[missions]]
id = "root"
text = "Connect as root"
criterion = { kind = "connected", user = "root" }
"#;
        let c = LessonConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(c.user, "alumno-saiyan");
        assert_eq!(c.target.port, 1234);
        assert_eq!(c.motd_line(), None);
        assert_eq!(c.filesystem.len(), 1);
        assert_eq!(c.missions.len(), 1);
        assert_eq!(c.missions[0].id, "root");
    }

    #[test]
    fn motd_substitutes_placeholders() {
        let c = LessonConfig::default();
        assert_eq!(
            c.motd_line().as_deref(),
            Some("Welcome to laptop-local. Type 'help' if you get lost.")
        );
    }

    #[test]
    fn relative_home_is_rejected() {
        let err = LessonConfig::from_toml_str("home = \"alumno\"").unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn zero_port_is_rejected() {
        let err = LessonConfig::from_toml_str("[target]\nport = 0").unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = LessonConfig::from_toml_str("user = [").unwrap_err();
        assert!(matches!(err, SimError::TomlParse(_)));
    }

    #[test]
    fn verify_password_with_fixed_secret() {
        let target = TargetConfig {
            accounts: vec![Account {
                user: "root".into(),
                password: Some("1234".into()),
            }],
            ..TargetConfig::default()
        };
        assert!(target.verify_password("root", "1234"));
        assert!(!target.verify_password("root", "4321"));
        assert!(!target.verify_password("alumno", "1234"));
    }

    #[test]
    fn verify_password_any_secret_for_listed_user() {
        let target = TargetConfig::default();
        assert!(target.verify_password("alumno", "whatever"));
        assert!(!target.verify_password("mallory", "whatever"));
    }

    #[test]
    fn login_accepts_unlisted_users_unless_closed() {
        let mut target = TargetConfig::default();
        assert!(target.verify_login("root", "anything"));
        assert!(!target.verify_password("root", "anything"));
        target.open_login = false;
        assert!(!target.verify_login("root", "anything"));
        assert!(target.verify_login("alumno", "anything"));
    }

    #[test]
    fn login_keeps_listed_passwords() {
        let target = TargetConfig {
            accounts: vec![Account {
                user: "root".into(),
                password: Some("1234".into()),
            }],
            ..TargetConfig::default()
        };
        assert!(!target.verify_login("root", "4321"));
        assert!(target.verify_login("root", "1234"));
        assert!(target.verify_login("alumno", "whatever"));
    }

    #[test]
    fn verify_password_open_target() {
        let target = TargetConfig {
            accounts: Vec::new(),
            ..TargetConfig::default()
        };
        assert!(target.verify_password("anyone", ""));
    }
}
