use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Configuration for spawning a child process.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Option<Duration>,
    pub log_prefix: String,
}

impl ProcessConfig {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        let command = command.into();
        Self {
            log_prefix: command.clone(),
            command,
            args,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Output from a completed child process.
#[derive(Debug)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub signal: Option<i32>,
    pub stdout_lines: Vec<String>,
    pub stderr_lines: Vec<String>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && self.signal.is_none()
    }

    /// Stdout followed by stderr, the latter only when non-empty.
    pub fn combined(&self) -> String {
        let stdout = self.stdout_lines.join("\n");
        let stderr = self.stderr_lines.join("\n");
        match (stdout.is_empty(), stderr.is_empty()) {
            (_, true) => stdout,
            (true, false) => stderr,
            (false, false) => format!("{stdout}\n{stderr}"),
        }
    }
}

/// A finished command reduced to what the review layer consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub output: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run a command and fold every failure into `(message, 1)`.
pub async fn run_command(config: ProcessConfig) -> CommandOutput {
    match spawn_and_capture(config).await {
        Ok(output) => CommandOutput {
            output: output.combined(),
            exit_code: output.exit_code,
        },
        Err(e) => {
            warn!("{e}");
            CommandOutput {
                output: e.to_string(),
                exit_code: 1,
            }
        }
    }
}

/// Spawn a child process, collect its output line-by-line, and wait for it.
///
/// The child is placed in its own process group on Unix so that a timeout can
/// take down everything it started.
pub async fn spawn_and_capture(config: ProcessConfig) -> Result<ProcessOutput> {
    let mut cmd = Command::new(&config.command);
    cmd.args(&config.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::CommandNotFound(config.command.clone()),
        _ => Error::Process(format!("failed to spawn '{}': {e}", config.command)),
    })?;

    let pid = child
        .id()
        .ok_or_else(|| Error::Process("child has no pid".into()))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::Process("child stdout not captured".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| Error::Process("child stderr not captured".into()))?;

    let prefix_out = config.log_prefix.clone();
    let prefix_err = config.log_prefix;

    let stdout_task = tokio::spawn(collect_lines(stdout, prefix_out));
    let stderr_task = tokio::spawn(collect_lines(stderr, prefix_err));

    let status = if let Some(dur) = config.timeout {
        match tokio::time::timeout(dur, child.wait()).await {
            Ok(r) => r.map_err(|e| Error::Process(format!("wait error: {e}")))?,
            Err(_) => {
                #[cfg(unix)]
                unsafe {
                    libc::killpg(pid as i32, libc::SIGTERM);
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
                #[cfg(unix)]
                unsafe {
                    libc::killpg(pid as i32, libc::SIGKILL);
                }
                #[cfg(not(unix))]
                let _ = (pid, child.start_kill());
                stdout_task.abort();
                stderr_task.abort();
                return Err(Error::Timeout(dur));
            }
        }
    } else {
        child
            .wait()
            .await
            .map_err(|e| Error::Process(format!("wait error: {e}")))?
    };

    let stdout_lines = stdout_task
        .await
        .map_err(|e| Error::Process(format!("stdout reader failed: {e}")))?;
    let stderr_lines = stderr_task
        .await
        .map_err(|e| Error::Process(format!("stderr reader failed: {e}")))?;

    let (exit_code, signal) = extract_exit_info(&status);

    Ok(ProcessOutput {
        exit_code,
        signal,
        stdout_lines,
        stderr_lines,
    })
}

/// Reads `\n`-terminated lines until EOF. Invalid UTF-8 is replaced, not fatal.
async fn collect_lines<R: AsyncRead + Unpin>(stream: R, prefix: String) -> Vec<String> {
    let mut lines = Vec::new();
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }
        let line = String::from_utf8_lossy(&buf).into_owned();
        debug!("[{prefix}] {line}");
        lines.push(line);
    }
    lines
}

fn extract_exit_info(status: &std::process::ExitStatus) -> (i32, Option<i32>) {
    if let Some(code) = status.code() {
        return (code, None);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return (128 + sig, Some(sig));
        }
    }
    (-1, None)
}
