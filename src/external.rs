//! Launching external programs in the background.

use crate::command::{CommandStatus, Dispatch};
use crate::error::{Result, ShellError};
use crate::jobs::JobTable;
use crate::parser::ParsedCommand;
use crate::session::Session;
use crate::signals::SignalBlock;
use log::{debug, warn};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Resolve `args[0]` through the session's `PATH`, spawn it with the requested
/// redirections and record it as a job.
///
/// Returns [`Dispatch::NotHandled`] when no executable matches, so the caller can
/// report command-not-found. The child is never waited for.
pub(crate) fn dispatch(cmd: &ParsedCommand, session: &mut Session, jobs: &mut JobTable) -> Dispatch {
    let Some(name) = cmd.name() else {
        return Dispatch::NotHandled;
    };
    let search_paths = session.get_env("PATH").unwrap_or_default();
    let Some(program) = find_command_path(OsStr::new(&search_paths), Path::new(name)) else {
        debug!("`{name}` not found in PATH");
        return Dispatch::NotHandled;
    };
    let program = program.into_owned();

    Dispatch::Handled(spawn(&program, cmd, session).map(|pid| {
        let job = match jobs.add(pid, name) {
            Ok(n) => Some(n),
            Err(e) => {
                // The process is running; only its tracking is lost.
                warn!("{name} (pid {pid}) is running untracked: {e}");
                session.record(e.kind());
                None
            }
        };
        CommandStatus::Spawned { pid, job }
    }))
}

fn spawn(program: &Path, cmd: &ParsedCommand, session: &Session) -> Result<u32> {
    let name = cmd.name().unwrap_or_default();

    let mut command = Command::new(program);
    command
        .arg0(name)
        .args(&cmd.argv[1..])
        .envs(session.env().overrides());

    if let Some(path) = &cmd.input {
        command.stdin(Stdio::from(open_input(path)?));
    }
    if let Some(path) = &cmd.output {
        command.stdout(Stdio::from(open_output(path, cmd.append)?));
    }

    let child = {
        let _blocked = SignalBlock::new(session.blocked_signals())?;
        command.spawn().map_err(|source| ShellError::Spawn {
            command: name.to_string(),
            source,
        })?
    };
    debug!("spawned {} as pid {}", program.display(), child.id());
    // Dropping the handle leaves the child running; the job table reaps it.
    Ok(child.id())
}

fn open_input(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| ShellError::Redirection {
        path: path.to_path_buf(),
        source,
    })
}

fn open_output(path: &Path, append: bool) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).mode(0o644);
    if append {
        options.append(true);
    } else {
        options.truncate(true);
    }
    options.open(path).map_err(|source| ShellError::Redirection {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it is an executable file.
/// - Relative with multiple components (e.g., `bin/sh`) or `./`-prefixed: returns it
///   if it is an executable file, relative to the current directory.
/// - Single path component (no separators): search each directory in `search_paths`
///   (PATH) and return the first executable match.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() || path.starts_with("./") {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|candidate| is_executable(candidate))
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if is_executable(path) { Some(path) } else { None }
}

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::parser::extract_redirections;
    use std::fs;
    use std::time::{Duration, Instant};

    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    fn parsed(line: &str) -> ParsedCommand {
        extract_redirections(crate::lexer::split_into_tokens(line)).unwrap()
    }

    fn wait_for(jobs: &mut JobTable) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while jobs.running() > 0 {
            assert!(Instant::now() < deadline, "child never exited");
            jobs.poll();
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn absolute_existing_true() {
        let path = Path::new("/bin/sh");
        let found = find_command_path(osstr("/bin"), path).expect("Expected to find /bin/sh");
        assert_eq!(found.as_ref(), path);
    }

    #[test]
    fn absolute_nonexisting() {
        let res = find_command_path(osstr("/bin"), Path::new("/bin/nonexisting"));
        assert!(res.is_none());
    }

    #[test]
    fn single_component_found_in_path() {
        let found = find_command_path(osstr("/nonexistent:/bin"), Path::new("sh"))
            .expect("Expected to find 'sh' in /bin via PATH search");
        assert_eq!(found.as_ref(), Path::new("/bin/sh"));
    }

    #[test]
    fn single_component_not_found_in_path() {
        let res = find_command_path(osstr("/bin"), Path::new("nonexisting"));
        assert!(res.is_none());
    }

    #[test]
    fn non_executable_files_and_dirs_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plain"), "data").unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        let search = dir.path().as_os_str();

        assert!(find_command_path(search, Path::new("plain")).is_none());
        assert!(find_command_path(search, Path::new("subdir")).is_none());
    }

    #[test]
    fn empty_path_is_none() {
        assert!(find_command_path(osstr("/bin"), Path::new("")).is_none());
    }

    #[test]
    fn unresolvable_command_is_not_handled() {
        let mut session = Session::default();
        let mut jobs = JobTable::new(4);
        let res = dispatch(&parsed("no_such_command_cmdshell_test"), &mut session, &mut jobs);
        assert!(matches!(res, Dispatch::NotHandled));
        assert!(jobs.is_empty());
    }

    #[test]
    fn output_redirect_truncates_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        fs::write(&out, "stale contents that must go away\n").unwrap();

        let mut session = Session::default();
        let mut jobs = JobTable::new(4);

        let line = format!("echo first > {}", out.display());
        let res = dispatch(&parsed(&line), &mut session, &mut jobs);
        assert!(matches!(res, Dispatch::Handled(Ok(CommandStatus::Spawned { .. }))));
        wait_for(&mut jobs);
        assert_eq!(fs::read_to_string(&out).unwrap(), "first\n");

        let line = format!("echo second >> {}", out.display());
        dispatch(&parsed(&line), &mut session, &mut jobs);
        wait_for(&mut jobs);
        assert_eq!(fs::read_to_string(&out).unwrap(), "first\nsecond\n");
        assert_eq!(jobs.len(), 2);
    }

    #[test]
    fn append_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("fresh.txt");
        assert!(!out.exists());

        let mut session = Session::default();
        let mut jobs = JobTable::new(4);
        let line = format!("echo appended >> {}", out.display());
        let res = dispatch(&parsed(&line), &mut session, &mut jobs);
        assert!(matches!(res, Dispatch::Handled(Ok(CommandStatus::Spawned { .. }))));
        wait_for(&mut jobs);
        assert_eq!(fs::read_to_string(&out).unwrap(), "appended\n");
    }

    #[test]
    fn created_output_is_not_group_or_world_writable() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("mode.txt");

        let file = open_output(&out, false).unwrap();
        drop(file);
        let mode = fs::metadata(&out).unwrap().permissions().mode() & 0o777;
        // 0644 before the umask is applied.
        assert_eq!(mode & !0o644, 0, "unexpected mode {mode:o}");
        assert_eq!(mode & 0o600, 0o600, "owner must read and write, got {mode:o}");

        let appended = dir.path().join("mode_append.txt");
        drop(open_output(&appended, true).unwrap());
        let mode = fs::metadata(&appended).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode & !0o644, 0, "unexpected mode {mode:o}");
    }

    #[test]
    fn missing_input_file_is_execution_failure() {
        let dir = tempfile::tempdir().unwrap();
        let line = format!("cat < {}", dir.path().join("missing.txt").display());

        let mut session = Session::default();
        let mut jobs = JobTable::new(4);
        match dispatch(&parsed(&line), &mut session, &mut jobs) {
            Dispatch::Handled(Err(e)) => assert_eq!(e.kind(), ErrorKind::ExecutionFailed),
            other => panic!("expected a redirection failure, got {other:?}"),
        }
        assert!(jobs.is_empty());
    }

    #[test]
    fn session_env_reaches_child() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("env.txt");

        let mut session = Session::default();
        session.set_env("CMDSHELL_CHILD_VAR", "from-session").unwrap();
        let mut jobs = JobTable::new(4);

        let line = format!("printenv CMDSHELL_CHILD_VAR > {}", out.display());
        dispatch(&parsed(&line), &mut session, &mut jobs);
        wait_for(&mut jobs);
        assert_eq!(fs::read_to_string(&out).unwrap(), "from-session\n");
    }

    #[test]
    fn full_job_table_still_runs_command() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("untracked.txt");

        let mut session = Session::default();
        let mut jobs = JobTable::new(0);

        let line = format!("echo untracked > {}", out.display());
        let pid = match dispatch(&parsed(&line), &mut session, &mut jobs) {
            Dispatch::Handled(Ok(CommandStatus::Spawned { pid, job: None })) => pid,
            other => panic!("expected an untracked spawn, got {other:?}"),
        };
        assert_eq!(session.last_error(), Some(ErrorKind::CapacityExceeded));

        // Reap it ourselves since the table could not.
        let raw = nix::unistd::Pid::from_raw(pid as i32);
        nix::sys::wait::waitpid(raw, None).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "untracked\n");
    }
}
