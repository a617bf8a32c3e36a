//! Shell session over a persistent child process.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::error::{code_label, Result, ShellError};
use crate::framer::{strip_marker_lines, Framer};
use crate::marker::{Marker, READY_MARKER};

/// Bytes per read on the child's output pipes.
const READ_CHUNK_SIZE: usize = 8192;

/// Grace period after the marker appears, so stderr written before the
/// marker is not attributed to the next command.
const STDERR_GRACE: Duration = Duration::from_millis(50);

/// Result of executing one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Output attributed to the command. On failure this prefers stderr,
    /// then stdout, then a synthetic process-exited message.
    pub text: String,
    /// False when stderr activity occurred or the process died mid-command.
    pub succeeded: bool,
}

/// Raw traffic from the pipe pump tasks.
#[derive(Debug)]
enum StreamEvent {
    Stdout(String),
    Stderr(String),
}

/// One interactive shell process inside a container.
///
/// At most one child process per session; [`ShellSession::start`] tears
/// down any prior process first. `execute` takes `&mut self`, so two
/// commands can never be in flight at once: output belonging to command
/// N is never attributed to command N+1.
pub struct ShellSession {
    /// Container image this session was created for.
    image: String,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    events: Option<mpsc::UnboundedReceiver<StreamEvent>>,
    /// Output received but not yet claimed by a marker match.
    buffer: String,
    started: bool,
}

impl ShellSession {
    /// Create a session for the given container image. No process is
    /// spawned until [`ShellSession::start`].
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            child: None,
            stdin: None,
            events: None,
            buffer: String::new(),
            started: false,
        }
    }

    /// The container image this session targets.
    pub fn image(&self) -> &str {
        &self.image
    }

    /// Whether a child process is currently attached.
    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// The container invocation used when no launch override is given:
    /// interactive, no tty, default shell.
    fn default_argv(&self) -> Vec<String> {
        vec![
            "docker".to_string(),
            "run".to_string(),
            "-i".to_string(),
            self.image.clone(),
            "/bin/bash".to_string(),
        ]
    }

    /// Spawn the shell process and wait for it to become ready.
    ///
    /// `launch` overrides the full argument vector (e.g. an
    /// oracle-generated `docker run` line); otherwise the default
    /// container invocation for the session's image is used. A readiness
    /// probe (`echo` of a fixed marker) is written immediately; the call
    /// resolves once the probe comes back, returning the boot banner with
    /// the probe's own echo filtered out. Every chunk received is also
    /// forwarded to `on_data`.
    ///
    /// # Errors
    ///
    /// [`ShellError::Spawn`] if the process cannot be started,
    /// [`ShellError::BootFailed`] if it exits before the readiness marker.
    pub async fn start(
        &mut self,
        launch: Option<Vec<String>>,
        mut on_data: impl FnMut(&str),
    ) -> Result<String> {
        self.cleanup().await;

        let argv = launch.unwrap_or_else(|| self.default_argv());
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ShellError::Spawn("empty launch command".to_string()))?;

        debug!(program = %program, args = ?args, "spawning shell process");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ShellError::Spawn(format!("{program}: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ShellError::Spawn("stdout pipe unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ShellError::Spawn("stderr pipe unavailable".to_string()))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ShellError::Spawn("stdin pipe unavailable".to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        pump(stdout, tx.clone(), StreamEvent::Stdout);
        pump(stderr, tx, StreamEvent::Stderr);

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.events = Some(rx);
        self.started = true;

        // A process that dies instantly can break the pipe before the
        // probe lands; the exit path below reports that as BootFailed.
        if let Err(e) = self.write_line(&format!("echo {READY_MARKER}")).await {
            trace!(error = %e, "readiness probe write failed");
        }

        let mut boot = String::new();
        let mut boot_stderr = String::new();
        loop {
            match self.recv().await {
                Some(StreamEvent::Stdout(chunk)) => {
                    on_data(&chunk);
                    boot.push_str(&chunk);
                    if let Some(idx) = boot.find(READY_MARKER) {
                        // Anything past the probe line belongs to the
                        // first command.
                        let after = &boot[idx + READY_MARKER.len()..];
                        self.buffer = after
                            .strip_prefix("\r\n")
                            .or_else(|| after.strip_prefix('\n'))
                            .unwrap_or(after)
                            .to_string();
                        let banner = strip_marker_lines(&boot[..idx], READY_MARKER);
                        debug!(banner_len = banner.len(), "shell session ready");
                        return Ok(banner);
                    }
                }
                Some(StreamEvent::Stderr(chunk)) => {
                    warn!(len = chunk.len(), "stderr during boot");
                    on_data(&chunk);
                    boot_stderr.push_str(&chunk);
                }
                None => {
                    let code = self.reap().await;
                    self.teardown_io();
                    let detail = if boot_stderr.trim().is_empty() {
                        format!(
                            "process exited before readiness marker (exit code {})",
                            code_label(code)
                        )
                    } else {
                        boot_stderr.trim().to_string()
                    };
                    return Err(ShellError::BootFailed(detail));
                }
            }
        }
    }

    /// Execute one command and return its framed output.
    ///
    /// Writes `command` followed by an `echo` of a fresh marker,
    /// accumulates stdout until the marker appears, and forwards every
    /// chunk to `on_progress` while waiting. Ordinary command failures
    /// resolve (`succeeded == false`) rather than erroring: stderr
    /// activity flips the flag (stderr content is preferred in `text`),
    /// and a process that dies mid-command yields best-effort text or a
    /// synthetic process-exited message.
    ///
    /// # Errors
    ///
    /// [`ShellError::NotStarted`] if the session was never started,
    /// [`ShellError::SessionClosed`] if it was cleaned up.
    pub async fn execute(
        &mut self,
        command: &str,
        mut on_progress: impl FnMut(&str),
    ) -> Result<ExecOutcome> {
        match self.execute_framed(command, &mut on_progress).await {
            Err(ShellError::ProcessExited { code }) => Ok(ExecOutcome {
                text: ShellError::ProcessExited { code }.to_string(),
                succeeded: false,
            }),
            other => other,
        }
    }

    async fn execute_framed(
        &mut self,
        command: &str,
        on_progress: &mut impl FnMut(&str),
    ) -> Result<ExecOutcome> {
        if !self.started {
            return Err(ShellError::NotStarted);
        }
        if self.child.is_none() {
            return Err(ShellError::SessionClosed);
        }

        let marker = Marker::generate();
        let mut framer = Framer::new(&marker, command);
        let mut stderr_out = String::new();

        // Carry-over bytes from the previous command. The marker is fresh,
        // so these can never complete the frame on their own.
        let residual = std::mem::take(&mut self.buffer);
        if !residual.is_empty() {
            framer.push(&residual);
        }

        trace!(command = %command, marker = %marker, "executing command");
        self.write_line(&format!("{command}\necho {marker}")).await?;

        loop {
            match self.recv().await {
                Some(StreamEvent::Stdout(chunk)) => {
                    on_progress(&chunk);
                    if let Some(framed) = framer.push(&chunk) {
                        self.buffer = framed.remainder;
                        // Stderr is a separate pipe; give writes that
                        // happened before the marker a moment to arrive.
                        tokio::time::sleep(STDERR_GRACE).await;
                        self.drain_pending(&mut stderr_out);

                        let stderr_text = stderr_out.trim();
                        if stderr_text.is_empty() {
                            return Ok(ExecOutcome {
                                text: framed.text,
                                succeeded: true,
                            });
                        }
                        return Ok(ExecOutcome {
                            text: stderr_text.to_string(),
                            succeeded: false,
                        });
                    }
                }
                Some(StreamEvent::Stderr(chunk)) => {
                    on_progress(&chunk);
                    stderr_out.push_str(&chunk);
                }
                None => {
                    let code = self.reap().await;
                    self.teardown_io();
                    debug!(code = %code_label(code), "process exited mid-command");

                    let stdout_text = framer.into_captured();
                    let stdout_text = stdout_text.trim();
                    let stderr_text = stderr_out.trim();
                    if !stderr_text.is_empty() {
                        return Ok(ExecOutcome {
                            text: stderr_text.to_string(),
                            succeeded: false,
                        });
                    }
                    if !stdout_text.is_empty() {
                        return Ok(ExecOutcome {
                            text: stdout_text.to_string(),
                            succeeded: false,
                        });
                    }
                    return Err(ShellError::ProcessExited { code });
                }
            }
        }
    }

    /// Terminate the process and clear all session state.
    ///
    /// Closes stdin first (letting a well-behaved shell exit on its own),
    /// then kills whatever is left. Safe to call on an already-cleaned-up
    /// session.
    pub async fn cleanup(&mut self) {
        self.stdin.take();
        if let Some(mut child) = self.child.take() {
            debug!(image = %self.image, "terminating shell process");
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
        self.teardown_io();
    }

    async fn recv(&mut self) -> Option<StreamEvent> {
        match self.events.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Consume already-delivered events without waiting. Post-marker
    /// stdout is carried over to the next command; stderr joins this
    /// command's error output.
    fn drain_pending(&mut self, stderr_out: &mut String) {
        let Some(rx) = self.events.as_mut() else {
            return;
        };
        while let Ok(event) = rx.try_recv() {
            match event {
                StreamEvent::Stdout(chunk) => self.buffer.push_str(&chunk),
                StreamEvent::Stderr(chunk) => stderr_out.push_str(&chunk),
            }
        }
    }

    async fn reap(&mut self) -> Option<i32> {
        match self.child.take() {
            Some(mut child) => child.wait().await.ok().and_then(|status| status.code()),
            None => None,
        }
    }

    fn teardown_io(&mut self) {
        self.stdin.take();
        self.events.take();
        self.buffer.clear();
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or(ShellError::SessionClosed)?;
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }
}

/// Forward chunked reads from a pipe into the session's event channel.
fn pump<R>(mut reader: R, tx: mpsc::UnboundedSender<StreamEvent>, wrap: fn(String) -> StreamEvent)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; READ_CHUNK_SIZE];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                    if tx.send(wrap(chunk)).is_err() {
                        break;
                    }
                }
            }
        }
    });
}
