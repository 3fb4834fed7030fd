//! Error types for termsim.

/// Errors produced by the simulation engine.
///
/// `Command` and `Vfs` carry text that is shown to the learner as-is, so
/// their display form is the bare message.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("{0}")]
    Command(String),

    #[error("{0}")]
    Vfs(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("VFS invariant violated: {0}")]
    Invariant(String),

    #[error("another interactive prompt is already active")]
    DialogueActive,

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_displays_bare_message() {
        let e = SimError::Command("mkdir: missing operand".into());
        assert_eq!(format!("{e}"), "mkdir: missing operand");
    }

    #[test]
    fn vfs_error_displays_bare_message() {
        let e = SimError::Vfs("cat: x: No such file or directory".into());
        assert_eq!(format!("{e}"), "cat: x: No such file or directory");
    }

    #[test]
    fn config_error_display() {
        let e = SimError::Config("home is not a directory".into());
        assert_eq!(format!("{e}"), "config error: home is not a directory");
    }

    #[test]
    fn invariant_error_display() {
        let e = SimError::Invariant("/a lists missing child b".into());
        assert!(format!("{e}").contains("invariant"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let toml_err = toml::from_str::<toml::Value>("this is [[[not valid toml").unwrap_err();
        let e: SimError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn result_alias_err() {
        let r: Result<i32> = Err(SimError::DialogueActive);
        assert!(r.is_err());
    }
}
