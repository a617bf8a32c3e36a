//! The turn-based orchestration loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use pilot_events::{Outcome, Speaker, Turn, TurnBus};
use pilot_oracle::{Continuation, Oracle, OracleError, OracleReply, OracleRequest};
use pilot_shell::{ExecOutcome, ShellSession};

use crate::config::LoopConfig;
use crate::error::{OrchestratorError, Result};
use crate::{prompts, signals};

/// Cancellation handle for a running pilot.
///
/// Cancellation is cooperative: the flag is observed at the loop's
/// suspension points (after each oracle call, shell execution, and
/// delay), never preemptively. Stopping does not kill the shell process;
/// a later session action reclaims it.
#[derive(Debug, Clone)]
pub struct PilotHandle {
    stopped: Arc<AtomicBool>,
}

impl PilotHandle {
    /// Request cancellation of the current run.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Drives one container shell under oracle control.
///
/// Owns the active [`ShellSession`] and the oracle continuation token for
/// the run; at most one run is active per instance, and starting a new
/// run tears down the previous session first.
pub struct PilotLoop {
    oracle: Arc<dyn Oracle>,
    bus: TurnBus,
    config: LoopConfig,
    session: Option<ShellSession>,
    continuation: Option<Continuation>,
    stopped: Arc<AtomicBool>,
    /// Speaker and text of the most recent final turn, referenced by the
    /// terminated turn on cancellation.
    last: (Speaker, String),
}

impl PilotLoop {
    /// Create a pilot with default timing.
    pub fn new(oracle: Arc<dyn Oracle>, bus: TurnBus) -> Self {
        Self::with_config(oracle, bus, LoopConfig::default())
    }

    /// Create a pilot with explicit timing configuration.
    pub fn with_config(oracle: Arc<dyn Oracle>, bus: TurnBus, config: LoopConfig) -> Self {
        Self {
            oracle,
            bus,
            config,
            session: None,
            continuation: None,
            stopped: Arc::new(AtomicBool::new(false)),
            last: (Speaker::User, String::new()),
        }
    }

    /// A handle that can cancel the run from another task.
    pub fn handle(&self) -> PilotHandle {
        PilotHandle {
            stopped: Arc::clone(&self.stopped),
        }
    }

    /// Request cancellation (same effect as [`PilotHandle::stop`]).
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Run a goal against a container image from scratch.
    ///
    /// Asks the oracle for a launch command, boots a fresh session with
    /// it, establishes the task protocol, executes the oracle's first
    /// command, and enters the turn loop. Every step is emitted on the
    /// bus; the call returns when the oracle hands control back, when the
    /// run is cancelled, or with an error when the run cannot start.
    pub async fn start(&mut self, goal: &str, image: &str) -> Result<()> {
        // A fresh run begins uncancelled; a stop only binds to the run it
        // interrupted.
        self.stopped.store(false, Ordering::SeqCst);
        info!(goal = %goal, image = %image, "starting pilot run");

        // One command line from the oracle, nothing else.
        let launch_request = OracleRequest::new(prompts::launch_prompt(goal, image))
            .with_max_tokens(self.config.launch_max_tokens);
        let launch = match self.oracle_call(launch_request).await {
            Ok(reply) => reply,
            Err(e) => {
                self.emit_warn(e.to_string());
                return Err(e.into());
            }
        };
        if self.is_stopped() {
            self.emit_killed();
            return Ok(());
        }

        let argv = signals::tokenize_launch_line(&launch.text);
        if argv.is_empty() {
            return Err(OrchestratorError::EmptyLaunchCommand(launch.text));
        }
        let launch_line = argv.join(" ");
        debug!(launch = %launch_line, "tokenized launch command");

        // Never leak the previous run's process.
        if let Some(mut old) = self.session.take() {
            old.cleanup().await;
        }
        let mut session = ShellSession::new(image);

        sleep(self.config.settle_delay).await;
        if self.is_stopped() {
            self.emit_killed();
            return Ok(());
        }

        let bus = self.bus.clone();
        let banner = match session
            .start(Some(argv), |chunk| {
                bus.emit(Turn::partial(Speaker::Shell, chunk));
            })
            .await
        {
            Ok(banner) => banner,
            Err(e) => {
                self.emit_done(Speaker::Shell, e.to_string(), Outcome::Err);
                return Err(e.into());
            }
        };
        self.session = Some(session);
        self.emit_done(Speaker::Shell, banner, Outcome::Ok);
        if self.is_stopped() {
            self.emit_killed();
            return Ok(());
        }

        // Second conversation: the task protocol. Its continuation token
        // carries the whole command/result exchange from here on.
        let task_request = OracleRequest::new("")
            .with_system_prompt(prompts::task_prompt(goal, image, &launch_line));
        let first = match self.oracle_call(task_request).await {
            Ok(reply) => reply,
            Err(e) => {
                self.emit_warn(e.to_string());
                return Err(e.into());
            }
        };
        self.continuation = Some(first.continuation.clone());

        sleep(self.config.settle_delay).await;
        if self.is_stopped() {
            self.emit_killed();
            return Ok(());
        }

        let outcome = self.run_command(&first.text).await?;
        if self.is_stopped() {
            self.emit_killed();
            return Ok(());
        }
        self.emit_exec_result(&outcome);

        sleep(self.config.settle_delay).await;
        if self.is_stopped() {
            self.emit_killed();
            return Ok(());
        }

        self.turn_loop(tagged_result(&outcome)).await
    }

    /// Resume a stopped run by injecting a command.
    ///
    /// Clears the cancellation flag, executes `command` directly against
    /// the shell (no oracle call), and re-enters the turn loop with its
    /// tagged result.
    pub async fn send(&mut self, command: &str) -> Result<()> {
        self.stopped.store(false, Ordering::SeqCst);
        info!(len = command.len(), "resuming with injected command");
        self.emit_done(Speaker::User, command.to_string(), Outcome::Ok);

        let outcome = self.run_command(command).await?;
        self.emit_exec_result(&outcome);

        sleep(self.config.settle_delay).await;
        if self.is_stopped() {
            self.emit_killed();
            return Ok(());
        }

        self.turn_loop(tagged_result(&outcome)).await
    }

    /// Boot a fresh default session for `image` and run a single command,
    /// without involving the oracle.
    pub async fn run_direct(&mut self, image: &str, command: &str) -> Result<()> {
        info!(image = %image, "running direct command");

        if let Some(mut old) = self.session.take() {
            old.cleanup().await;
        }
        let mut session = ShellSession::new(image);

        let bus = self.bus.clone();
        session
            .start(None, |chunk| {
                bus.emit(Turn::partial(Speaker::Shell, chunk));
            })
            .await?;
        self.session = Some(session);

        let outcome = self.run_command(command).await?;
        let status = if outcome.succeeded {
            Outcome::Ok
        } else {
            Outcome::Err
        };
        self.emit_done(Speaker::User, outcome.text, status);
        Ok(())
    }

    /// Tear down the active session, if any.
    pub async fn shutdown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.cleanup().await;
        }
    }

    /// The gptMessage cycle: tagged result → oracle → maybe execute →
    /// repeat. Iterative on purpose; a long automation session must not
    /// grow the call stack.
    async fn turn_loop(&mut self, mut outbound: String) -> Result<()> {
        loop {
            if self.is_stopped() {
                self.emit_killed();
                return Ok(());
            }

            let mut request = OracleRequest::new(&outbound);
            if let Some(continuation) = self.continuation.clone() {
                request = request.with_continuation(continuation);
            }
            let Some(reply) = self.oracle_call_retrying(request).await else {
                // Warn turn already emitted; halt.
                return Ok(());
            };
            self.continuation = Some(reply.continuation.clone());

            if self.is_stopped() {
                self.emit_killed();
                return Ok(());
            }

            if signals::is_pause_request(&reply.text) {
                debug!("oracle requested a pause; handing control back");
                return Ok(());
            }
            if signals::all_lines_are_comments(&reply.text) {
                debug!("oracle response is all comments; ending run");
                return Ok(());
            }

            let outcome = self.run_command(&reply.text).await?;
            if self.is_stopped() {
                self.emit_killed();
                return Ok(());
            }
            self.emit_exec_result(&outcome);

            sleep(self.config.settle_delay).await;
            if self.is_stopped() {
                self.emit_killed();
                return Ok(());
            }

            outbound = tagged_result(&outcome);
        }
    }

    /// One oracle call with streamed partial turns and a done turn on
    /// success.
    async fn oracle_call(
        &mut self,
        request: OracleRequest,
    ) -> std::result::Result<OracleReply, OracleError> {
        let bus = self.bus.clone();
        let mut on_partial = |text: &str| {
            bus.emit(Turn::partial(Speaker::Oracle, text));
        };
        let reply = self.oracle.complete(request, &mut on_partial).await?;
        self.emit_done(Speaker::Oracle, reply.text.clone(), Outcome::Ok);
        Ok(reply)
    }

    /// Oracle call inside the turn loop: rate limits are retried with the
    /// identical request after a fixed backoff (unbounded, but stoppable);
    /// any other failure halts with a warn turn. `None` means the loop
    /// must stop; the caller emits nothing further.
    async fn oracle_call_retrying(&mut self, request: OracleRequest) -> Option<OracleReply> {
        loop {
            match self.oracle_call(request.clone()).await {
                Ok(reply) => return Some(reply),
                Err(e) if e.is_rate_limit() => {
                    self.emit_warn(e.to_string());
                    sleep(self.config.rate_limit_backoff).await;
                    if self.is_stopped() {
                        self.emit_killed();
                        return None;
                    }
                }
                Err(e) => {
                    self.emit_warn(e.to_string());
                    return None;
                }
            }
        }
    }

    /// Execute a command in the active session, streaming accumulated
    /// output as partial shell turns.
    async fn run_command(&mut self, command: &str) -> Result<ExecOutcome> {
        let session = self.session.as_mut().ok_or(OrchestratorError::NoSession)?;
        let bus = self.bus.clone();
        let mut streamed = String::new();
        let outcome = session
            .execute(command, |chunk| {
                streamed.push_str(chunk);
                bus.emit(Turn::partial(Speaker::Shell, streamed.clone()));
            })
            .await?;
        Ok(outcome)
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn emit_done(&mut self, speaker: Speaker, message: String, outcome: Outcome) {
        self.last = (speaker, message.clone());
        self.bus.emit(Turn::new(speaker, message, pilot_events::Phase::Done, outcome));
    }

    fn emit_warn(&mut self, message: String) {
        warn!(message = %message, "oracle call failed");
        self.last = (Speaker::Oracle, message.clone());
        self.bus.emit(Turn::warn(Speaker::Oracle, message));
    }

    fn emit_exec_result(&mut self, outcome: &ExecOutcome) {
        let status = if outcome.succeeded {
            Outcome::Ok
        } else {
            Outcome::Err
        };
        self.emit_done(Speaker::Shell, outcome.text.clone(), status);
    }

    /// Exactly one terminated turn per observed cancellation, naming what
    /// was killed.
    fn emit_killed(&mut self) {
        let (speaker, message) = self.last.clone();
        info!(speaker = %speaker, "run cancelled");
        self.bus.emit(Turn::terminated(speaker, format!("Killed: {message}")));
    }
}

/// Tag a shell result the way the task protocol promises the oracle.
fn tagged_result(outcome: &ExecOutcome) -> String {
    let prefix = if outcome.succeeded { "OK" } else { "ERR" };
    format!("{prefix}: {}", outcome.text)
}
