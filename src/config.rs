//! Session configuration.

/// Default prompt printed before each read in interactive mode.
pub const DEFAULT_PROMPT: &str = "> ";
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
pub const DEFAULT_ENV_CAPACITY: usize = 100;
pub const DEFAULT_COMMAND_CAPACITY: usize = 50;
pub const DEFAULT_JOB_CAPACITY: usize = 100;

/// Knobs fixed at session creation.
///
/// Every table the session owns is bounded; going past a bound is reported as
/// [`ShellError::CapacityExceeded`](crate::error::ShellError::CapacityExceeded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub prompt: String,
    pub interactive: bool,
    pub history_capacity: usize,
    pub env_capacity: usize,
    pub command_capacity: usize,
    pub job_capacity: usize,
}

impl ShellConfig {
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity;
        self
    }

    pub fn job_capacity(mut self, capacity: usize) -> Self {
        self.job_capacity = capacity;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn env_capacity(mut self, capacity: usize) -> Self {
        self.env_capacity = capacity;
        self
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            interactive: true,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            env_capacity: DEFAULT_ENV_CAPACITY,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            job_capacity: DEFAULT_JOB_CAPACITY,
        }
    }
}
