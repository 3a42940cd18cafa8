use crate::builtin::is_builtin;
use crate::error::{Result, ShellError};
use crate::session::Session;
use log::debug;
use std::io::Write;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// What running a command produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// An in-process command (custom or built-in) ran to completion.
    Finished(ExitCode),
    /// An external process was started and left running in the background.
    ///
    /// `job` is the 1-based job number, or `None` if the job table was full and the
    /// process is running untracked.
    Spawned { pid: u32, job: Option<usize> },
}

impl CommandStatus {
    pub fn is_success(&self) -> bool {
        match self {
            CommandStatus::Finished(code) => *code == 0,
            CommandStatus::Spawned { .. } => true,
        }
    }
}

/// Outcome of offering a command to one resolution strategy.
///
/// `NotHandled` means the strategy does not own the name and the next one should
/// be tried. `Handled` means it does, whether or not running it succeeded; a
/// failing handler never falls through to the next strategy.
#[derive(Debug)]
pub enum Dispatch {
    NotHandled,
    Handled(Result<CommandStatus>),
}

/// A caller-supplied command.
///
/// Receives the session, the full argument list (`args[0]` is the command name, so
/// `args.len()` is the argument count) and the shell's output sink. Returning an
/// error reports the command as failed; it does not make the shell look further.
pub type CommandCallback =
    Box<dyn Fn(&mut Session, &[String], &mut dyn Write) -> anyhow::Result<ExitCode>>;

struct CustomCommand {
    name: String,
    callback: CommandCallback,
}

/// Fixed-capacity set of custom commands, consulted before built-ins.
pub struct CommandRegistry {
    commands: Vec<CustomCommand>,
    capacity: usize,
}

impl CommandRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            commands: Vec::new(),
            capacity,
        }
    }

    /// Register `callback` under `name`.
    ///
    /// Names must be a single non-empty token and must not already be registered.
    /// Registering past capacity fails and leaves existing entries untouched.
    pub fn register<F>(&mut self, name: &str, callback: F) -> Result<()>
    where
        F: Fn(&mut Session, &[String], &mut dyn Write) -> anyhow::Result<ExitCode> + 'static,
    {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ShellError::InvalidArgument(format!(
                "invalid command name {name:?}"
            )));
        }
        if matches!(name, "<" | ">" | ">>") {
            return Err(ShellError::InvalidArgument(format!(
                "`{name}` is a redirection operator"
            )));
        }
        if self.contains(name) {
            return Err(ShellError::InvalidArgument(format!(
                "command `{name}` is already registered"
            )));
        }
        if self.commands.len() >= self.capacity {
            return Err(ShellError::CapacityExceeded {
                what: "custom command registry",
                capacity: self.capacity,
            });
        }
        if is_builtin(name) {
            debug!("custom command `{name}` shadows the built-in");
        }
        self.commands.push(CustomCommand {
            name: name.to_string(),
            callback: Box::new(callback),
        });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.iter().any(|c| c.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run `args[0]` if it is a registered command.
    pub fn dispatch(&self, session: &mut Session, args: &[String], out: &mut dyn Write) -> Dispatch {
        let Some(name) = args.first() else {
            return Dispatch::NotHandled;
        };
        let Some(cmd) = self.commands.iter().find(|c| &c.name == name) else {
            return Dispatch::NotHandled;
        };

        debug!("running custom command `{name}`");
        Dispatch::Handled(match (cmd.callback)(session, args, out) {
            Ok(code) => Ok(CommandStatus::Finished(code)),
            Err(e) => Err(ShellError::CommandFailed {
                command: name.clone(),
                reason: format!("{e:#}"),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn args(line: &str) -> Vec<String> {
        crate::lexer::split_into_tokens(line)
    }

    fn hello(_: &mut Session, args: &[String], out: &mut dyn Write) -> anyhow::Result<ExitCode> {
        match args.get(1) {
            Some(who) => writeln!(out, "Hello, {who}!")?,
            None => writeln!(out, "Hello, world!")?,
        }
        Ok(0)
    }

    #[test]
    fn dispatches_registered_name() {
        let mut registry = CommandRegistry::new(4);
        registry.register("hello", hello).unwrap();

        let mut session = Session::default();
        let mut out = Vec::new();
        let res = registry.dispatch(&mut session, &args("hello bob"), &mut out);
        assert!(matches!(res, Dispatch::Handled(Ok(CommandStatus::Finished(0)))));
        assert_eq!(String::from_utf8(out).unwrap(), "Hello, bob!\n");
    }

    #[test]
    fn unknown_name_is_not_handled() {
        let registry = CommandRegistry::new(4);
        let mut session = Session::default();
        let res = registry.dispatch(&mut session, &args("hello"), &mut Vec::new());
        assert!(matches!(res, Dispatch::NotHandled));
        let res = registry.dispatch(&mut session, &[], &mut Vec::new());
        assert!(matches!(res, Dispatch::NotHandled));
    }

    #[test]
    fn failing_callback_is_still_handled() {
        let mut registry = CommandRegistry::new(4);
        registry
            .register("fail", |_, _, _| Err(anyhow::anyhow!("boom")))
            .unwrap();

        let mut session = Session::default();
        match registry.dispatch(&mut session, &args("fail"), &mut Vec::new()) {
            Dispatch::Handled(Err(e)) => {
                assert_eq!(e.kind(), ErrorKind::ExecutionFailed);
                assert_eq!(e.to_string(), "fail: boom");
            }
            other => panic!("expected handled failure, got {other:?}"),
        }
    }

    #[test]
    fn nonzero_exit_code_is_handled() {
        let mut registry = CommandRegistry::new(4);
        registry.register("three", |_, _, _| Ok(3)).unwrap();
        let mut session = Session::default();
        let res = registry.dispatch(&mut session, &args("three"), &mut Vec::new());
        assert!(matches!(res, Dispatch::Handled(Ok(CommandStatus::Finished(3)))));
    }

    #[test]
    fn capacity_is_enforced_and_earlier_entries_survive() {
        let capacity = 3;
        let mut registry = CommandRegistry::new(capacity);
        for i in 0..capacity {
            registry
                .register(&format!("cmd{i}"), move |_, _, _| Ok(i as ExitCode))
                .unwrap();
        }
        let err = registry.register("one_too_many", |_, _, _| Ok(0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
        assert_eq!(registry.len(), capacity);

        let mut session = Session::default();
        for i in 0..capacity {
            let res = registry.dispatch(&mut session, &args(&format!("cmd{i}")), &mut Vec::new());
            match res {
                Dispatch::Handled(Ok(CommandStatus::Finished(code))) => {
                    assert_eq!(code, i as ExitCode)
                }
                other => panic!("cmd{i} not invokable: {other:?}"),
            }
        }
    }

    #[test]
    fn duplicates_and_bad_names_are_rejected() {
        let mut registry = CommandRegistry::new(4);
        registry.register("hello", hello).unwrap();

        for name in ["hello", "", "two words", ">>"] {
            let err = registry.register(name, hello).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "name {name:?}");
        }
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["hello"]);
    }

    #[test]
    fn callback_sees_session() {
        let mut registry = CommandRegistry::new(4);
        registry
            .register("setvar", |session, args, _| {
                session.set_env(&args[1], &args[2])?;
                Ok(0)
            })
            .unwrap();
        let mut session = Session::default();
        registry.dispatch(&mut session, &args("setvar CMDSHELL_CB x"), &mut Vec::new());
        assert_eq!(session.get_env("CMDSHELL_CB"), Some("x".to_string()));
    }
}
