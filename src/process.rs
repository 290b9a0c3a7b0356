//! External command execution with failure capture.
//!
//! Every external tool the builder drives (git, clang, make) goes through a
//! [`ProcessRunner`]. The runner blocks until the child exits, captures both
//! output streams, and on failure persists them to `<pid>_stdout.log` /
//! `<pid>_stderr.log` in its log directory before returning
//! [`BuildError::ExternalCommand`].
//!
//! # Example
//!
//! ```rust,ignore
//! use grass_builder::process::{Cmd, ProcessRunner};
//!
//! let runner = ProcessRunner::new(std::env::current_dir()?);
//! let result = runner.run(&Cmd::new("git").args(["submodule", "update", "--init"]))?;
//! println!("{}", result.stdout_str());
//! ```

use std::borrow::Cow;
use std::env;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{BuildError, IoContext, Result};

/// A command line to execute: program, arguments, optional working directory.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl Cmd {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn arg_path(self, path: &Path) -> Self {
        self.arg(path.as_os_str())
    }

    /// Run the child in `dir` instead of the runner's process directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured outcome of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandResult {
    pub fn stdout_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// Stdout followed by stderr, for tools that print banners on either stream.
    ///
    /// The streams always start on separate lines, so an unterminated last
    /// stdout line never runs into the first stderr line.
    pub fn combined_output(&self) -> String {
        let mut combined = self.stdout_str().into_owned();
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&self.stderr_str());
        combined
    }
}

/// Execution context for external commands.
///
/// Holds the log directory for failure dumps, the verbosity switch, and extra
/// `PATH` entries that are handed to every child. The builder's own
/// environment is never modified.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    log_dir: PathBuf,
    verbose: bool,
    search_path: Vec<PathBuf>,
}

impl ProcessRunner {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            verbose: false,
            search_path: Vec::new(),
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Derive a runner whose children also search `dir` for programs.
    pub fn with_search_path(&self, dir: &Path) -> Self {
        let mut runner = self.clone();
        if !runner.search_path.iter().any(|p| p == dir) {
            runner.search_path.push(dir.to_path_buf());
        }
        runner
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    /// Run `cmd` to completion.
    ///
    /// Returns the captured output when the child exits with status zero.
    /// Otherwise both streams are written to disk and an
    /// [`BuildError::ExternalCommand`] naming the log files is returned.
    pub fn run(&self, cmd: &Cmd) -> Result<CommandResult> {
        let cmd_line = cmd.to_string();
        if self.verbose {
            println!("Execute command: \"{}\"...", cmd_line);
        }
        tracing::debug!(command = %cmd_line, "spawning");

        let mut command = Command::new(cmd.program());
        command
            .args(cmd.get_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &cmd.current_dir {
            command.current_dir(dir);
        }
        if let Some(path) = self.child_path()? {
            command.env("PATH", path);
        }

        let child = command.spawn().map_err(|e| spawn_error(&cmd_line, e))?;
        let pid = child.id();
        let output = child
            .wait_with_output()
            .io_context(|| format!("waiting for `{}`", cmd_line))?;

        let result = CommandResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: output.stderr,
        };

        if output.status.success() {
            if self.verbose {
                println!("  result: ok");
                tracing::debug!(stdout = %result.stdout_str(), stderr = %result.stderr_str(), "command output");
            }
            return Ok(result);
        }

        if self.verbose {
            println!("  result: failed");
        }
        let (stdout_log, stderr_log) = self.persist_logs(pid, &result)?;
        tracing::warn!(
            command = %cmd_line,
            status = %output.status,
            stdout_log = %stdout_log.display(),
            stderr_log = %stderr_log.display(),
            "command failed"
        );

        Err(BuildError::ExternalCommand {
            command: cmd_line,
            exit_code: output.status.code(),
            stdout_log,
            stderr_log,
            log_dir: self.log_dir().to_path_buf(),
        })
    }

    fn persist_logs(&self, pid: u32, result: &CommandResult) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(&self.log_dir)
            .io_context(|| format!("creating log directory '{}'", self.log_dir.display()))?;

        let stdout_log = self.log_dir.join(format!("{}_stdout.log", pid));
        let stderr_log = self.log_dir.join(format!("{}_stderr.log", pid));
        fs::write(&stdout_log, &result.stdout)
            .io_context(|| format!("writing '{}'", stdout_log.display()))?;
        fs::write(&stderr_log, &result.stderr)
            .io_context(|| format!("writing '{}'", stderr_log.display()))?;

        Ok((stdout_log, stderr_log))
    }

    /// `PATH` for children: the inherited value with extra entries appended.
    fn child_path(&self) -> Result<Option<OsString>> {
        if self.search_path.is_empty() {
            return Ok(None);
        }

        let mut entries: Vec<PathBuf> = env::var_os("PATH")
            .map(|p| env::split_paths(&p).collect())
            .unwrap_or_default();
        for dir in &self.search_path {
            if !entries.contains(dir) {
                entries.push(dir.clone());
            }
        }

        env::join_paths(entries).map(Some).map_err(|e| BuildError::Io {
            context: "composing child PATH".to_string(),
            source: io::Error::new(io::ErrorKind::InvalidInput, e),
        })
    }
}

fn spawn_error(cmd_line: &str, err: io::Error) -> BuildError {
    if err.kind() == io::ErrorKind::NotFound {
        return BuildError::MissingDependency(format!("cannot execute `{}`: {}", cmd_line, err));
    }
    BuildError::Io {
        context: format!("spawning `{}`", cmd_line),
        source: err,
    }
}
