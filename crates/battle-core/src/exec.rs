//! Bounded external process execution.
//!
//! Both the compile step and the workload run go through [`BoundedCommand`]:
//! spawn, capture stdout/stderr, wait under a wall-clock budget, and kill the
//! child if the budget is exceeded. Output captured before a kill is kept.
//!
//! On unix the child leads its own process group, so a kill also reaches
//! whatever it spawned (`g++` driving `cc1plus`, wrapper scripts).

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// Grace period for draining pipes after a timed-out child is killed.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Errors that prevent a process from running at all.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("executable not found: {program}")]
    NotFound { program: String },

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for process: {0}")]
    Wait(#[source] std::io::Error),
}

/// What a bounded process produced.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,

    /// Whether the process exited with status 0 within budget.
    pub success: bool,

    /// Captured stdout (lossy UTF-8).
    pub stdout: String,

    /// Captured stderr (lossy UTF-8).
    pub stderr: String,

    /// Wall-clock duration in milliseconds, capped at the budget on timeout.
    pub elapsed_ms: u64,

    /// Whether the budget was exceeded and the process killed.
    pub timed_out: bool,
}

impl ProcessOutput {
    /// stdout followed by stderr, as one stream.
    pub fn merged(&self) -> String {
        let mut merged = String::with_capacity(self.stdout.len() + self.stderr.len());
        merged.push_str(&self.stdout);
        merged.push_str(&self.stderr);
        merged
    }
}

/// An external command with a wall-clock budget.
#[derive(Debug, Clone)]
pub struct BoundedCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    budget: Duration,
}

impl BoundedCommand {
    pub fn new(program: impl Into<String>, budget: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            budget,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn argv(&self) -> &[String] {
        &self.args
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Spawn the command and wait for it, killing it if the budget runs out.
    ///
    /// A non-zero exit or a timeout is reported through [`ProcessOutput`];
    /// only failing to launch is an error.
    pub async fn run(&self) -> Result<ProcessOutput, ExecError> {
        let start = Instant::now();

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        #[cfg(unix)]
        command.process_group(0);

        debug!(program = %self.program, args = ?self.args, "spawning process");
        let mut child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExecError::NotFound {
                    program: self.program.clone(),
                }
            } else {
                ExecError::Spawn {
                    program: self.program.clone(),
                    source: e,
                }
            }
        })?;
        let pid = child.id();

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();

        let waited = tokio::time::timeout(self.budget, async {
            let (status, _, _) = tokio::join!(
                child.wait(),
                pump(&mut stdout_pipe, &mut stdout_buf),
                pump(&mut stderr_pipe, &mut stderr_buf),
            );
            status
        })
        .await;

        let mut output = match waited {
            Ok(status) => {
                let status = status.map_err(ExecError::Wait)?;
                ProcessOutput {
                    exit_code: status.code(),
                    success: status.success(),
                    elapsed_ms: start.elapsed().as_millis() as u64,
                    ..ProcessOutput::default()
                }
            }
            Err(_elapsed) => {
                warn!(
                    program = %self.program,
                    budget_secs = self.budget.as_secs(),
                    "process exceeded budget, killing"
                );
                kill_group(pid);
                if let Err(e) = child.kill().await {
                    warn!(program = %self.program, error = %e, "kill failed");
                }
                // Whatever is still buffered in the pipes belongs to this run.
                let _ = tokio::time::timeout(DRAIN_GRACE, async {
                    tokio::join!(
                        pump(&mut stdout_pipe, &mut stdout_buf),
                        pump(&mut stderr_pipe, &mut stderr_buf),
                    )
                })
                .await;
                ProcessOutput {
                    exit_code: None,
                    success: false,
                    elapsed_ms: self.budget.as_millis() as u64,
                    timed_out: true,
                    ..ProcessOutput::default()
                }
            }
        };

        output.stdout = String::from_utf8_lossy(&stdout_buf).into_owned();
        output.stderr = String::from_utf8_lossy(&stderr_buf).into_owned();
        Ok(output)
    }
}

/// SIGKILL the process group led by `pid`.
#[cfg(unix)]
fn kill_group(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };
    let ret = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        debug!(pid, error = %err, "killpg failed");
    }
}

#[cfg(not(unix))]
fn kill_group(_pid: Option<u32>) {}

/// Copy a pipe into `buf` chunk by chunk until EOF or error.
///
/// Bytes land in `buf` as soon as they are read, so a cancelled pump
/// still leaves everything received so far.
async fn pump<R: AsyncRead + Unpin>(pipe: &mut Option<R>, buf: &mut Vec<u8>) {
    let Some(reader) = pipe.as_mut() else {
        return;
    };
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}
