//! Process runner for the git executable.
//!
//! Every invocation goes through `GitRunner`, which:
//! - prepends `-c core.quotepath=false -c color.ui=false` so output is stable
//!   regardless of user configuration
//! - shares one in-flight process between identical concurrent calls, keyed on
//!   (working directory, argument list)
//! - classifies stderr of failed calls against a table of known benign
//!   messages; benign failures yield empty output, anything else is an error
//!
//! Spawning itself sits behind `ProcessExecutor` so the service can be driven
//! by a scripted executor in tests.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::Instant;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use regex::Regex;
use tokio::process::Command;

use super::locator::{GitLocation, GitVersion};
use crate::error::{GitError, Result};

const GLOBAL_ARGS: [&str; 4] = ["-c", "core.quotepath=false", "-c", "color.ui=false"];

/// On Windows, spawning a console app from a GUI subsystem app will open a new
/// console window unless we explicitly disable it.
fn hide_console_on_windows(_command: &mut std::process::Command) {
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        _command.creation_flags(CREATE_NO_WINDOW);
    }
}

pub(crate) fn tokio_command(program: impl AsRef<OsStr>) -> Command {
    let mut command = Command::new(program);
    hide_console_on_windows(command.as_std_mut());
    command
}

/// Captured result of one process run
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

pub type ExecFuture = BoxFuture<'static, std::io::Result<ProcessOutput>>;

/// Spawns a program and collects its output
pub trait ProcessExecutor: Send + Sync {
    fn execute(&self, program: &Path, cwd: &Path, args: &[String]) -> ExecFuture;
}

/// Real executor backed by `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioExecutor;

impl ProcessExecutor for TokioExecutor {
    fn execute(&self, program: &Path, cwd: &Path, args: &[String]) -> ExecFuture {
        let mut command = tokio_command(program);
        command
            .args(args)
            .current_dir(cwd)
            // Messages are matched against English text
            .env("LC_ALL", "C")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true);

        async move {
            let output = command.output().await?;
            Ok(ProcessOutput {
                code: output.status.code(),
                stdout: output.stdout,
                stderr: output.stderr,
            })
        }
        .boxed()
    }
}

/// Known-harmless failures. Queries hitting one of these resolve to empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenignReason {
    NotARepository,
    OutsideRepository,
    NoSuchPath,
    NoCommits,
    NotInRevision,
    NoUpstream,
    BadIndexRevision,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandFailure {
    Benign(BenignReason),
    Unexpected(String),
}

static BENIGN_PATTERNS: LazyLock<Vec<(Regex, BenignReason)>> = LazyLock::new(|| {
    [
        (r"(?i)not a git repository", BenignReason::NotARepository),
        (r"(?i)is outside repository", BenignReason::OutsideRepository),
        (r"(?i)no such path", BenignReason::NoSuchPath),
        (r"(?i)does not have any commits yet", BenignReason::NoCommits),
        (r"(?i)bad default revision 'HEAD'", BenignReason::NoCommits),
        (r"(?i)Path '.*?' does not exist in", BenignReason::NotInRevision),
        (r"(?i)Path '.*?' exists on disk, but not in", BenignReason::NotInRevision),
        (r"(?i)no upstream configured for branch", BenignReason::NoUpstream),
        (r"(?i)bad revision '0{40}:?'", BenignReason::BadIndexRevision),
        (r"(?i)ambiguous argument '0{40}:?'", BenignReason::BadIndexRevision),
    ]
    .into_iter()
    .map(|(pattern, reason)| (Regex::new(pattern).expect("valid benign pattern"), reason))
    .collect()
});

/// Classify the stderr of a failed invocation
pub fn classify(message: &str) -> CommandFailure {
    BENIGN_PATTERNS
        .iter()
        .find(|(re, _)| re.is_match(message))
        .map(|(_, reason)| CommandFailure::Benign(*reason))
        .unwrap_or_else(|| CommandFailure::Unexpected(message.trim().to_string()))
}

/// Decode process output. `None`, `utf-8` and `utf8` decode as UTF-8 (lossy);
/// `latin1`/`binary` map each byte to one char.
pub fn decode(bytes: &[u8], encoding: Option<&str>) -> String {
    match encoding.map(|e| e.to_ascii_lowercase()) {
        None => String::from_utf8_lossy(bytes).into_owned(),
        Some(label) => match label.as_str() {
            "utf-8" | "utf8" => String::from_utf8_lossy(bytes).into_owned(),
            "latin1" | "iso-8859-1" | "binary" => bytes.iter().map(|&b| b as char).collect(),
            other => {
                tracing::warn!(encoding = other, "Unsupported encoding, decoding as utf-8");
                String::from_utf8_lossy(bytes).into_owned()
            }
        },
    }
}

type RunKey = (PathBuf, Vec<String>);
type PendingRun = Shared<BoxFuture<'static, std::result::Result<Arc<Vec<u8>>, Arc<GitError>>>>;

pub struct GitRunner {
    git: GitLocation,
    executor: Arc<dyn ProcessExecutor>,
    pending: Mutex<HashMap<RunKey, PendingRun>>,
}

impl GitRunner {
    pub fn new(git: GitLocation, executor: Arc<dyn ProcessExecutor>) -> Self {
        Self {
            git,
            executor,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_tokio(git: GitLocation) -> Self {
        Self::new(git, Arc::new(TokioExecutor))
    }

    pub fn git_path(&self) -> &Path {
        &self.git.path
    }

    pub fn version(&self) -> GitVersion {
        self.git.version
    }

    /// Number of distinct invocations currently running
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Run and decode stdout as UTF-8
    pub async fn run(&self, cwd: &Path, args: &[String]) -> Result<String> {
        self.run_with_encoding(cwd, args, None).await
    }

    pub async fn run_with_encoding(
        &self,
        cwd: &Path,
        args: &[String],
        encoding: Option<&str>,
    ) -> Result<String> {
        let bytes = self.run_raw(cwd, args).await?;
        Ok(decode(&bytes, encoding))
    }

    /// Run and return stdout untouched
    pub async fn run_binary(&self, cwd: &Path, args: &[String]) -> Result<Vec<u8>> {
        let bytes = self.run_raw(cwd, args).await?;
        Ok(bytes.as_ref().clone())
    }

    async fn run_raw(&self, cwd: &Path, args: &[String]) -> Result<Arc<Vec<u8>>> {
        let key: RunKey = (cwd.to_path_buf(), args.to_vec());

        let run = {
            let mut pending = self.pending.lock();
            match pending.get(&key) {
                Some(run) => {
                    tracing::debug!(cwd = %cwd.display(), args = %args.join(" "), "Joining in-flight git call");
                    run.clone()
                }
                None => {
                    let run = execute(
                        self.executor.clone(),
                        self.git.path.clone(),
                        cwd.to_path_buf(),
                        args.to_vec(),
                    )
                    .boxed()
                    .shared();
                    pending.insert(key.clone(), run.clone());
                    run
                }
            }
        };

        let result = run.clone().await;

        {
            let mut pending = self.pending.lock();
            if pending.get(&key).is_some_and(|current| current.ptr_eq(&run)) {
                pending.remove(&key);
            }
        }

        result.map_err(GitError::Shared)
    }
}

async fn execute(
    executor: Arc<dyn ProcessExecutor>,
    git: PathBuf,
    cwd: PathBuf,
    args: Vec<String>,
) -> std::result::Result<Arc<Vec<u8>>, Arc<GitError>> {
    let full_args: Vec<String> = GLOBAL_ARGS
        .iter()
        .map(|a| a.to_string())
        .chain(args.iter().cloned())
        .collect();
    let command_line = args.join(" ");
    let start = Instant::now();

    let output = match executor.execute(&git, &cwd, &full_args).await {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(cwd = %cwd.display(), args = %command_line, error = %e, "Failed to spawn git");
            return Err(Arc::new(GitError::Io(e)));
        }
    };
    let elapsed = start.elapsed();

    if output.success() {
        tracing::debug!(cwd = %cwd.display(), args = %command_line, ?elapsed, "git completed");
        return Ok(Arc::new(output.stdout));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = match stderr.trim() {
        "" => format!("exited with code {:?}", output.code),
        text => text.to_string(),
    };

    match classify(&message) {
        CommandFailure::Benign(reason) => {
            tracing::warn!(cwd = %cwd.display(), args = %command_line, ?reason, ?elapsed, "git failed benignly: {}", message);
            Ok(Arc::new(Vec::new()))
        }
        CommandFailure::Unexpected(message) => {
            tracing::error!(cwd = %cwd.display(), args = %command_line, ?elapsed, "git failed: {}", message);
            Err(Arc::new(GitError::CommandFailed {
                args: command_line,
                cwd: cwd.display().to_string(),
                message,
            }))
        }
    }
}
