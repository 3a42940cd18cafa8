use crate::config::ShellConfig;
use crate::env::Environment;
use crate::error::{ErrorKind, Result};
use crate::history::History;
use crate::signals::critical_signals;
use nix::sys::signal::SigSet;

/// Mutable state of one shell instance, handed to custom commands and built-ins.
///
/// The session owns the prompt, the history, the environment overrides and the
/// last-error record. Jobs and registered commands live next to it in
/// [`Shell`](crate::Shell) so that a callback can borrow the session mutably while
/// the registry that holds the callback stays borrowed.
#[derive(Debug)]
pub struct Session {
    prompt: String,
    interactive: bool,
    history: History,
    env: Environment,
    last_error: Option<ErrorKind>,
    blocked_signals: SigSet,
    exit_code: Option<i32>,
}

impl Session {
    pub fn new(config: &ShellConfig) -> Self {
        Self {
            prompt: config.prompt.clone(),
            interactive: config.interactive,
            history: History::new(config.history_capacity),
            env: Environment::new(config.env_capacity),
            last_error: None,
            blocked_signals: critical_signals(),
            exit_code: None,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Record a line the user entered.
    pub fn add_history(&mut self, line: &str) -> Result<()> {
        self.history.push(line).inspect_err(|e| self.record(e.kind()))
    }

    pub fn history(&self) -> &[String] {
        self.history.entries()
    }

    pub fn get_env(&self, key: &str) -> Option<String> {
        self.env.get_var(key)
    }

    pub fn set_env(&mut self, key: &str, value: &str) -> Result<()> {
        self.env
            .set_var(key, value)
            .inspect_err(|e| self.record(e.kind()))
    }

    pub fn unset_env(&mut self, key: &str) -> Option<String> {
        self.env.unset_var(key)
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Kind of the most recent failure.
    ///
    /// Overwritten by every command executed; check return values instead of
    /// relying on this.
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    pub(crate) fn record(&mut self, kind: ErrorKind) {
        self.last_error = Some(kind);
    }

    pub(crate) fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Signals blocked on the shell thread while a child is being spawned.
    pub fn blocked_signals(&self) -> &SigSet {
        &self.blocked_signals
    }

    /// Ask the read loop to stop with `code`.
    pub fn request_exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }

    /// The exit code requested by `exit`, if it has run.
    pub fn exit_requested(&self) -> Option<i32> {
        self.exit_code
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&ShellConfig::default())
    }
}
