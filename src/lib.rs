//! A small, embeddable command shell.
//!
//! A line of input is split on whitespace, stripped of `<`, `>` and `>>`
//! redirections, and resolved against three sources in fixed order: commands
//! registered by the embedding program, the built-ins `exit`, `history` and
//! `jobs`, and finally executables found on `PATH`. External programs run in the
//! background with their standard input and output wired to the redirection
//! targets, and are tracked in a bounded job table that is polled without
//! blocking.
//!
//! The main entry point is [`Shell`]. There is deliberately no quoting, globbing,
//! variable expansion, pipelines or job-control signalling.

mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod error;
mod external;
pub mod history;
mod interpreter;
pub mod io_adapters;
pub mod jobs;
pub mod lexer;
pub mod parser;
pub mod session;
mod signals;

pub use builtin::{BUILTIN_NAMES, is_builtin};
pub use command::{CommandCallback, CommandRegistry, CommandStatus, ExitCode};
pub use config::ShellConfig;
pub use error::{ErrorKind, Result, ShellError};
pub use external::find_command_path;
pub use interpreter::Shell;
pub use io_adapters::MemWriter;
pub use jobs::{Completion, Job, JobTable};
pub use session::Session;
