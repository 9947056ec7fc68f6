//! Desktop notification sinks.

use std::io;
use std::path::PathBuf;
use std::process::Command;

use clap::ValueEnum;
use derive_more::Display;
use thiserror::Error;

/// Notification urgency, passed straight to the notification tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, ValueEnum)]
pub enum Urgency {
    #[display("low")]
    Low,
    #[display("normal")]
    Normal,
    #[default]
    #[display("critical")]
    Critical,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("`{program}` not found, install a notification daemon client")]
    NotFound { program: String },

    #[error("failed to execute `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

pub trait Notifier {
    fn notify(&self, urgency: Urgency, summary: &str, body: &str) -> Result<(), NotifyError>;
}

/// Shows notifications with `notify-send`.
#[derive(Debug, Clone)]
pub struct NotifySend {
    program: PathBuf,
}

impl Default for NotifySend {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM)
    }
}

impl NotifySend {
    pub const DEFAULT_PROGRAM: &'static str = "notify-send";

    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Notifier for NotifySend {
    fn notify(&self, urgency: Urgency, summary: &str, body: &str) -> Result<(), NotifyError> {
        let program = || self.program.display().to_string();

        let output = Command::new(&self.program)
            .arg(format!("--urgency={urgency}"))
            .arg(summary)
            .arg(body)
            .output()
            .map_err(|source| match source.kind() {
                io::ErrorKind::NotFound => NotifyError::NotFound { program: program() },
                _ => NotifyError::Spawn {
                    program: program(),
                    source,
                },
            })?;

        if !output.status.success() {
            return Err(NotifyError::Failed {
                program: program(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}
