//! Hand-off to the system `ssh` client.
//!
//! Once a lookup resolves to one instance, the launcher builds the `ssh`
//! argument vector (key identity, login user, private address, optional
//! verbosity and remote command) and runs the client with inherited stdio so
//! the user lands in an interactive session. Subprocess execution goes
//! through [`CommandSpawner`] so tests assert on the argument vector without
//! spawning anything.

use std::ffi::OsString;
use std::process::Command;

use camino::Utf8PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::config::{ConfigError, ConnectConfig};
use crate::inventory::InstanceRecord;

/// Exit outcome of a spawned command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExitOutcome {
    /// The process exited with this status code.
    Code(i32),
    /// The process was terminated without an exit code (e.g. by a signal).
    Terminated,
}

impl ExitOutcome {
    /// Returns `true` when the exit code equals zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Code(0))
    }
}

/// Errors raised while launching the remote-shell client.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum LaunchError {
    /// Raised when the connection configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when the resolved instance has no private IP address.
    #[error("instance {instance_id} has no private IP address")]
    MissingPrivateIp {
        /// Identifier of the resolved instance.
        instance_id: String,
    },
    /// Raised when the resolved instance has no key-pair name.
    #[error("instance {instance_id} has no key pair; cannot pick an identity file")]
    MissingKeyName {
        /// Identifier of the resolved instance.
        instance_id: String,
    },
    /// Raised when the client binary cannot be started.
    #[error("failed to run {program}: {message}")]
    Spawn {
        /// Program that could not be started.
        program: String,
        /// Operating system error detail.
        message: String,
    },
    /// Raised when the client exits unsuccessfully.
    #[error("{program} exited with status {status_text}")]
    CommandFailed {
        /// Program that failed.
        program: String,
        /// Exit status, or `unknown` when terminated without one.
        status_text: String,
    },
}

impl From<ConfigError> for LaunchError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

/// Per-invocation launch options layered on top of the configuration.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LaunchOptions {
    /// Pass `-v` to the client for verbose connection diagnostics.
    pub verbose: bool,
    /// Command to run on the remote host instead of an interactive shell.
    pub remote_command: Option<String>,
}

/// Abstraction over subprocess execution to support fakes in tests.
pub trait CommandSpawner {
    /// Runs `program` with the given arguments, stdio inherited from the
    /// parent, and reports how it exited.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::Spawn`] if the command cannot be started.
    fn spawn(&self, program: &str, args: &[OsString]) -> Result<ExitOutcome, LaunchError>;
}

/// Real spawner that shells out to the host operating system.
#[derive(Clone, Debug, Default)]
pub struct ProcessSpawner;

impl CommandSpawner for ProcessSpawner {
    fn spawn(&self, program: &str, args: &[OsString]) -> Result<ExitOutcome, LaunchError> {
        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|err| LaunchError::Spawn {
                program: program.to_owned(),
                message: err.to_string(),
            })?;

        Ok(status.code().map_or(ExitOutcome::Terminated, ExitOutcome::Code))
    }
}

/// Builds and runs the `ssh` invocation for a resolved instance.
#[derive(Clone, Debug)]
pub struct SshLauncher<S: CommandSpawner> {
    config: ConnectConfig,
    spawner: S,
}

impl SshLauncher<ProcessSpawner> {
    /// Convenience constructor that wires the real process spawner.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::Config`] when configuration validation fails.
    pub fn with_process_spawner(config: ConnectConfig) -> Result<Self, LaunchError> {
        Self::new(config, ProcessSpawner)
    }
}

impl<S: CommandSpawner> SshLauncher<S> {
    /// Creates a launcher using the provided spawner and configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::Config`] when configuration validation fails.
    pub fn new(config: ConnectConfig, spawner: S) -> Result<Self, LaunchError> {
        config.validate()?;
        Ok(Self { config, spawner })
    }

    /// Returns the identity file path for a key-pair name:
    /// `<key_dir>/<key_name>.pem` with the key directory tilde-expanded.
    #[must_use]
    pub fn key_path(&self, key_name: &str) -> Utf8PathBuf {
        self.config.resolved_key_dir().join(format!("{key_name}.pem"))
    }

    /// Connects to the resolved instance, blocking until the client exits.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError`] when the record lacks a private IP or
    /// key-pair name, when the client cannot be spawned, or when it exits
    /// unsuccessfully.
    pub fn connect(
        &self,
        instance: &InstanceRecord,
        options: &LaunchOptions,
    ) -> Result<(), LaunchError> {
        let instance_id = instance.id.clone().unwrap_or_else(|| "unknown".to_owned());
        let private_ip =
            instance
                .private_ip
                .as_deref()
                .ok_or_else(|| LaunchError::MissingPrivateIp {
                    instance_id: instance_id.clone(),
                })?;
        let key_name = instance
            .key_name
            .as_deref()
            .ok_or_else(|| LaunchError::MissingKeyName {
                instance_id: instance_id.clone(),
            })?;

        let identity = self.key_path(key_name);
        debug!(identity = %identity, "resolved identity file");

        let mut args = vec![
            OsString::from("-i"),
            OsString::from(identity.as_str()),
            OsString::from("-l"),
            OsString::from(&self.config.ssh_user),
        ];
        if options.verbose {
            args.push(OsString::from("-v"));
        }
        args.push(OsString::from(private_ip));
        if let Some(ref command) = options.remote_command {
            args.push(OsString::from(command));
        }

        debug!(program = %self.config.ssh_bin, ?args, "running remote-shell client");
        let outcome = self.spawner.spawn(&self.config.ssh_bin, &args)?;
        if outcome.is_success() {
            return Ok(());
        }

        let status_text = match outcome {
            ExitOutcome::Code(code) => code.to_string(),
            ExitOutcome::Terminated => "unknown".to_owned(),
        };
        Err(LaunchError::CommandFailed {
            program: self.config.ssh_bin.clone(),
            status_text,
        })
    }
}
