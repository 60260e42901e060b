//! Connection configuration loading via `ortho-config`.

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Default directory searched for key-pair identity files.
pub const DEFAULT_KEY_DIR: &str = "~/.ssh";

/// Default login user on the remote instance.
pub const DEFAULT_SSH_USER: &str = "ec2-user";

/// Connection settings derived from configuration files, environment
/// variables, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "AWSSH")]
pub struct ConnectConfig {
    /// Directory holding `<key name>.pem` identity files. Supports a leading
    /// `~/`. The `-p` flag and the `AWS_KEY_PATH` environment variable
    /// override this at the CLI boundary.
    #[ortho_config(default = DEFAULT_KEY_DIR.to_owned())]
    pub key_dir: String,
    /// Login user passed to the client with `-l`.
    #[ortho_config(default = DEFAULT_SSH_USER.to_owned())]
    pub ssh_user: String,
    /// Path to the `ssh` executable.
    #[ortho_config(default = "ssh".to_owned())]
    pub ssh_bin: String,
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}

impl ConnectConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables; CLI
    /// overrides are layered on afterwards by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("awssh")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Ensures configuration values are present after trimming whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_value(&self.key_dir, "key_dir")?;
        Self::require_value(&self.ssh_user, "ssh_user")?;
        Self::require_value(&self.ssh_bin, "ssh_bin")?;
        Ok(())
    }

    fn require_value(value: &str, field: &str) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(field.to_owned()));
        }
        Ok(())
    }

    /// Returns the key directory with a leading `~/` expanded.
    #[must_use]
    pub fn resolved_key_dir(&self) -> Utf8PathBuf {
        Utf8PathBuf::from(expand_tilde(&self.key_dir))
    }
}

/// Expands a leading `~/` prefix to the user's home directory.
///
/// If the `HOME` environment variable is not set, the function returns the
/// input string unchanged (i.e., the leading `~` is not expanded).
#[must_use]
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return format!("{}/{rest}", home.to_string_lossy());
    }
    path.to_owned()
}
