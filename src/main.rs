use anyhow::Context;
use argh::FromArgs;
use cmdshell::{Shell, ShellConfig};
use std::io::{IsTerminal, Write};

#[derive(FromArgs)]
/// A small command shell with background jobs and `<`, `>`, `>>` redirection.
struct Args {
    #[argh(option, default = "String::from(cmdshell::config::DEFAULT_PROMPT)")]
    /// prompt printed before each line in interactive mode.
    prompt: String,

    #[argh(switch)]
    /// read commands from stdin without a prompt or line editor.
    non_interactive: bool,
}

fn hello(
    _session: &mut cmdshell::Session,
    args: &[String],
    out: &mut dyn Write,
) -> anyhow::Result<cmdshell::ExitCode> {
    match args.get(1) {
        Some(name) => writeln!(out, "Hello, {name}!")?,
        None => writeln!(out, "Hello, world!")?,
    }
    Ok(0)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Args = argh::from_env();
    let interactive = !args.non_interactive && std::io::stdin().is_terminal();
    let config = ShellConfig::default()
        .with_prompt(args.prompt)
        .interactive(interactive);

    let mut shell = Shell::new(config);
    shell.register_command("hello", hello)?;

    let code = if shell.session().is_interactive() {
        shell.repl().context("line editor failed")?
    } else {
        shell
            .run_lines(std::io::stdin().lock())
            .context("failed to read standard input")?
    };
    std::process::exit(code)
}
