//! Running the external `git` binary.
//!
//! Everything the repository does goes through [`Executor::run`]: a command
//! string that is split on whitespace into subcommand tokens, followed by
//! argument tokens that are passed through untouched. That split lets a
//! caller write `"remote set-head origin -a"` as one command while a commit
//! message or a URL containing spaces still reaches git as a single argv
//! entry.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, trace};

use crate::git::error::{GitError, GitResult};

/// Environment variable that overrides which git binary is used.
pub const GIT_ENV_VAR: &str = "GITSHADOW_GIT";

/// Variables inherited from a surrounding git invocation (hooks, aliases)
/// that would redirect our commands to someone else's repository.
const GIT_ENV_OVERRIDES: [&str; 4] = [
    "GIT_DIR",
    "GIT_WORK_TREE",
    "GIT_INDEX_FILE",
    "GIT_COMMON_DIR",
];

/// Something that can run git commands.
///
/// The repository only ever talks to git through this trait, so callers can
/// supply a pre-built handle (for instance one that wraps the binary with
/// extra environment) instead of a path.
pub trait Executor: fmt::Debug + Send + Sync {
    /// Run `git <command tokens> <args>` in `cwd`, feeding `stdin` if given.
    ///
    /// Returns captured stdout. A nonzero exit becomes
    /// [`GitError::Command`] carrying stderr.
    fn run(&self, cwd: &Path, command: &str, args: &[&str], stdin: Option<&[u8]>)
        -> GitResult<Vec<u8>>;
}

/// The production executor: a git binary on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitExecutable {
    program: PathBuf,
}

impl GitExecutable {
    /// use the binary at `program` (a bare name is looked up on PATH)
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// honor `GITSHADOW_GIT`, falling back to `git` on PATH
    pub fn from_env() -> Self {
        match std::env::var_os(GIT_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::new(path),
            _ => Self::new("git"),
        }
    }

    /// the program that will be spawned
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, cwd: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        for key in GIT_ENV_OVERRIDES {
            cmd.env_remove(key);
        }
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.current_dir(cwd);
        cmd
    }
}

impl Default for GitExecutable {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Executor for GitExecutable {
    fn run(
        &self,
        cwd: &Path,
        command: &str,
        args: &[&str],
        stdin: Option<&[u8]>,
    ) -> GitResult<Vec<u8>> {
        let mut cmd = self.command(cwd);
        cmd.args(command.split_whitespace()).args(args);
        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!(command, ?args, cwd = %cwd.display(), "running git");

        let spawn_error = |source| GitError::Spawn {
            program: self.program.clone(),
            source,
        };
        let mut child = cmd.spawn().map_err(spawn_error)?;

        // Feed stdin from its own thread so a chatty stdout can't deadlock us.
        let output = std::thread::scope(|scope| {
            let writer = match (child.stdin.take(), stdin) {
                (Some(mut pipe), Some(input)) => {
                    Some(scope.spawn(move || pipe.write_all(input)))
                }
                _ => None,
            };
            let output = child.wait_with_output();
            if let Some(writer) = writer {
                match writer.join() {
                    Ok(Err(e)) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                        return Err(e);
                    }
                    _ => {}
                }
            }
            output
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let full = render_command(command, args);
            debug!(command = %full, status = ?output.status.code(), %stderr, "git failed");
            return Err(GitError::Command {
                command: full,
                status: output.status.code(),
                stderr,
            });
        }

        trace!(command, bytes = output.stdout.len(), "git succeeded");
        Ok(output.stdout)
    }
}

/// Human-readable form of a command for error messages.
fn render_command(command: &str, args: &[&str]) -> String {
    command
        .split_whitespace()
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run a command and return its stdout as trimmed UTF-8.
pub(crate) fn run_text(
    executor: &dyn Executor,
    cwd: &Path,
    command: &str,
    args: &[&str],
) -> GitResult<String> {
    let stdout = executor.run(cwd, command, args, None)?;
    Ok(String::from_utf8(stdout)?.trim().to_string())
}
