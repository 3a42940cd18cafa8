//! Error types for the shell engine.

use std::io;
use std::path::PathBuf;

/// Coarse classification of a [`ShellError`].
///
/// This is what [`Session::last_error`](crate::session::Session::last_error) records,
/// so it is `Copy` and carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidSyntax,
    CapacityExceeded,
    NotFound,
    ExecutionFailed,
    SignalSetup,
}

/// Errors produced while registering, resolving or running commands.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("syntax error: {0}")]
    InvalidSyntax(String),

    #[error("{what} is full (capacity {capacity})")]
    CapacityExceeded { what: &'static str, capacity: usize },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("{command}: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("cannot open {}: {source}", path.display())]
    Redirection {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("signal mask: {0}")]
    Signal(#[from] nix::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Classify this error for last-error bookkeeping.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShellError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ShellError::InvalidSyntax(_) => ErrorKind::InvalidSyntax,
            ShellError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            ShellError::CommandNotFound(_) => ErrorKind::NotFound,
            ShellError::CommandFailed { .. }
            | ShellError::Redirection { .. }
            | ShellError::Spawn { .. }
            | ShellError::Io(_) => ErrorKind::ExecutionFailed,
            ShellError::Signal(_) => ErrorKind::SignalSetup,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ShellError>;
