use crate::builtin::{self, BuiltinContext};
use crate::command::{CommandRegistry, CommandStatus, Dispatch, ExitCode};
use crate::config::ShellConfig;
use crate::error::{Result, ShellError};
use crate::external;
use crate::jobs::{Completion, JobTable};
use crate::lexer;
use crate::parser::{self, ParsedCommand};
use crate::session::Session;
use log::{debug, warn};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{BufRead, Write};

/// A shell instance: session state, custom commands and background jobs.
///
/// Each line is resolved against custom commands first, then the built-ins
/// (`exit`, `history`, `jobs`), then executables on `PATH`. External commands are
/// started in the background and tracked as jobs; nothing ever waits for them.
///
/// Example
/// ```
/// use cmdshell::{CommandStatus, MemWriter, Shell, ShellConfig};
/// use std::io::Write;
///
/// let out = MemWriter::new();
/// let mut sh = Shell::new(ShellConfig::default()).with_output(out.clone());
/// sh.register_command("hello", |_session, args, out| {
///     writeln!(out, "Hello, {}!", args.get(1).map_or("world", |s| s.as_str()))?;
///     Ok(0)
/// })
/// .unwrap();
///
/// let status = sh.execute_command("hello there").unwrap();
/// assert_eq!(status, CommandStatus::Finished(0));
/// assert_eq!(out.contents(), "Hello, there!\n");
/// ```
pub struct Shell {
    session: Session,
    registry: CommandRegistry,
    jobs: JobTable,
    out: Box<dyn Write>,
}

impl Shell {
    pub fn new(config: ShellConfig) -> Self {
        Self {
            session: Session::new(&config),
            registry: CommandRegistry::new(config.command_capacity),
            jobs: JobTable::new(config.job_capacity),
            out: Box::new(std::io::stdout()),
        }
    }

    /// Send what built-ins and custom commands print to `out` instead of stdout.
    ///
    /// External commands are unaffected; they write to the inherited descriptors
    /// or to their redirection targets.
    pub fn with_output(mut self, out: impl Write + 'static) -> Self {
        self.out = Box::new(out);
        self
    }

    /// Register a custom command. See [`CommandRegistry::register`].
    pub fn register_command<F>(&mut self, name: &str, callback: F) -> Result<()>
    where
        F: Fn(&mut Session, &[String], &mut dyn Write) -> anyhow::Result<ExitCode> + 'static,
    {
        self.registry
            .register(name, callback)
            .inspect_err(|e| self.session.record(e.kind()))
    }

    /// Tokenize, strip redirections and run one line.
    ///
    /// The line is not added to history; the read loops do that. The session's
    /// last-error is reset at the start of every call.
    pub fn execute_command(&mut self, line: &str) -> Result<CommandStatus> {
        self.session.clear_error();
        let result = parser::extract_redirections(lexer::split_into_tokens(line))
            .and_then(|cmd| self.resolve(&cmd));
        if let Err(e) = &result {
            self.session.record(e.kind());
        }
        result
    }

    fn resolve(&mut self, cmd: &ParsedCommand) -> Result<CommandStatus> {
        let Some(name) = cmd.name() else {
            return Err(ShellError::CommandNotFound(String::new()));
        };

        match self.registry.dispatch(&mut self.session, &cmd.argv, self.out.as_mut()) {
            Dispatch::Handled(result) => return self.in_process(cmd, result),
            Dispatch::NotHandled => {}
        }

        let mut ctx = BuiltinContext {
            session: &mut self.session,
            jobs: &mut self.jobs,
        };
        match builtin::dispatch(&cmd.argv, &mut ctx, self.out.as_mut()) {
            Dispatch::Handled(result) => return self.in_process(cmd, result),
            Dispatch::NotHandled => {}
        }

        match external::dispatch(cmd, &mut self.session, &mut self.jobs) {
            Dispatch::Handled(result) => result,
            Dispatch::NotHandled => Err(ShellError::CommandNotFound(name.to_string())),
        }
    }

    fn in_process(
        &mut self,
        cmd: &ParsedCommand,
        result: Result<CommandStatus>,
    ) -> Result<CommandStatus> {
        if cmd.redirects() {
            debug!("redirection ignored for in-process command `{}`", cmd.argv[0]);
        }
        if let Err(e) = self.out.flush() {
            warn!("cannot flush output of `{}`: {e}", cmd.argv[0]);
        }
        result
    }

    /// Track an externally spawned process. Returns its 1-based job number.
    pub fn add_job(&mut self, pid: u32, command: &str) -> Result<usize> {
        self.jobs
            .add(pid, command)
            .inspect_err(|e| self.session.record(e.kind()))
    }

    /// Check running jobs without blocking; returns those that finished since the
    /// last poll.
    pub fn poll_jobs(&mut self) -> Vec<Completion> {
        self.jobs.poll()
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Poll jobs and print a notice for each one that finished.
    pub fn report_finished_jobs(&mut self) {
        for done in self.jobs.poll() {
            if let Err(e) = writeln!(self.out, "{done}") {
                warn!("cannot report finished job: {e}");
            }
        }
        if let Err(e) = self.out.flush() {
            warn!("cannot flush job notices: {e}");
        }
    }

    /// Record, run and report one input line. Returns the exit code once `exit` ran.
    fn handle_line(&mut self, line: &str) -> Option<ExitCode> {
        if line.trim().is_empty() {
            return self.session.exit_requested();
        }
        if let Err(e) = self.session.add_history(line) {
            warn!("line not saved: {e}");
        }
        if let Err(e) = self.execute_command(line) {
            eprintln!("cmdshell: {e}");
        }
        self.session.exit_requested()
    }

    /// Interactive read loop on the terminal.
    ///
    /// Prints the session prompt before every read and reports finished jobs
    /// before each prompt. Ends on `exit` or end of input; Ctrl-C discards the
    /// current line.
    pub fn repl(&mut self) -> rustyline::Result<ExitCode> {
        let mut rl = DefaultEditor::new()?;

        loop {
            self.report_finished_jobs();
            match rl.readline(self.session.prompt()) {
                Ok(line) => {
                    rl.add_history_entry(line.as_str())?;
                    if let Some(code) = self.handle_line(&line) {
                        return Ok(code);
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(0),
                Err(err) => return Err(err),
            }
        }
    }

    /// Non-interactive read loop: one command per line of `input`, no prompt.
    ///
    /// End of input is a clean exit with status 0. Bytes that are not valid UTF-8
    /// are replaced rather than ending the loop.
    pub fn run_lines(&mut self, input: impl BufRead) -> std::io::Result<ExitCode> {
        for raw in input.split(b'\n') {
            let mut raw = raw?;
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
            let line = String::from_utf8_lossy(&raw);
            self.report_finished_jobs();
            if let Some(code) = self.handle_line(&line) {
                return Ok(code);
            }
        }
        Ok(0)
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new(ShellConfig::default())
    }
}
