use crate::command::{CommandStatus, Dispatch, ExitCode};
use crate::error::Result;
use crate::jobs::JobTable;
use crate::session::Session;
use argh::{EarlyExit, FromArgs};
use log::debug;
use std::io::Write;

/// Names handled by the built-in dispatcher. The set is closed.
pub const BUILTIN_NAMES: [&str; 3] = ["exit", "history", "jobs"];

/// Shell-owned state a built-in may touch.
pub(crate) struct BuiltinContext<'a> {
    pub session: &'a mut Session,
    pub jobs: &'a mut JobTable,
}

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "jobs".
    fn name() -> &'static str;

    /// Executes the command against the shell state, printing to `stdout`.
    fn execute(self, ctx: &mut BuiltinContext<'_>, stdout: &mut dyn Write) -> Result<ExitCode>;
}

fn run<T: BuiltinCommand>(args: &[&str], ctx: &mut BuiltinContext<'_>, stdout: &mut dyn Write) -> Dispatch {
    debug!("running built-in `{}`", T::name());
    let result = match T::from_args(&[T::name()], args) {
        Ok(cmd) => cmd.execute(ctx, stdout),
        // `--help` or a usage error: the command is still ours.
        Err(EarlyExit { output, status }) => write_usage(stdout, &output, status.is_err()),
    };
    Dispatch::Handled(result.map(CommandStatus::Finished))
}

fn write_usage(stdout: &mut dyn Write, output: &str, is_error: bool) -> Result<ExitCode> {
    stdout.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        writeln!(stdout)?;
    }
    Ok(if is_error { 1 } else { 0 })
}

/// Run `args[0]` if it names a built-in.
pub(crate) fn dispatch(args: &[String], ctx: &mut BuiltinContext<'_>, stdout: &mut dyn Write) -> Dispatch {
    let Some((name, rest)) = args.split_first() else {
        return Dispatch::NotHandled;
    };
    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();

    match name.as_str() {
        n if n == Exit::name() => run::<Exit>(&rest, ctx, stdout),
        n if n == History::name() => run::<History>(&rest, ctx, stdout),
        n if n == Jobs::name() => run::<Jobs>(&rest, ctx, stdout),
        _ => Dispatch::NotHandled,
    }
}

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

#[derive(FromArgs)]
/// Exit the shell.
pub(crate) struct Exit {
    #[argh(positional)]
    /// exit status of the shell process; defaults to 0.
    pub code: Option<ExitCode>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, ctx: &mut BuiltinContext<'_>, _stdout: &mut dyn Write) -> Result<ExitCode> {
        ctx.session.request_exit(self.code.unwrap_or(0));
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List previously entered command lines, oldest first.
pub(crate) struct History {}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, ctx: &mut BuiltinContext<'_>, stdout: &mut dyn Write) -> Result<ExitCode> {
        for (i, line) in ctx.session.history().iter().enumerate() {
            writeln!(stdout, "{}: {}", i + 1, line)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Report finished background jobs, then list every job and its status.
pub(crate) struct Jobs {}

impl BuiltinCommand for Jobs {
    fn name() -> &'static str {
        "jobs"
    }

    fn execute(self, ctx: &mut BuiltinContext<'_>, stdout: &mut dyn Write) -> Result<ExitCode> {
        for done in ctx.jobs.poll() {
            writeln!(stdout, "{done}")?;
        }
        ctx.jobs.write_listing(stdout)?;
        Ok(0)
    }
}
