//! Command-backed engines.
//!
//! Production deployments shell out to an external translator process,
//! configured by environment (`ENGINE_COMMAND`, `CLASSIC_ENGINE_COMMAND`).
//! Both styles receive the resolved configuration as a JSON file passed via
//! `--config`. The streaming command prints one JSON event per stdout line;
//! the classic command prints `current/total [stage]` progress lines and
//! writes its artifacts into the output directory on its own.

use std::io::{BufRead, BufReader};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::io::AsyncBufReadExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use doctrans_core::defaults::{
    CLASSIC_ENGINE_COMMAND, ENGINE_COMMAND, ENGINE_PROBE_TIMEOUT_SECS, ENV_CLASSIC_ENGINE_COMMAND,
    ENV_ENGINE_COMMAND,
};
use doctrans_core::{Error, ExecutionConfig, Result};

use crate::engine::{
    CallbackEngine, EngineHealth, EngineRun, StreamingEngine, TranslateEvent,
};

/// Serialize the job configuration into a temp file the child can read.
/// The file must outlive the child process.
fn write_config_file(config: &ExecutionConfig) -> Result<NamedTempFile> {
    let file = tempfile::Builder::new()
        .prefix("doctrans-job-")
        .suffix(".json")
        .tempfile()?;
    serde_json::to_writer(file.as_file(), config)?;
    Ok(file)
}

/// Run `<command> --version` with a timeout; report availability and the
/// first output line as the version.
async fn probe_command(command: &str) -> EngineHealth {
    let probe = Command::new(command).arg("--version").output();
    match tokio::time::timeout(Duration::from_secs(ENGINE_PROBE_TIMEOUT_SECS), probe).await {
        Ok(Ok(output)) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty());
            EngineHealth {
                available: true,
                version,
            }
        }
        Ok(Ok(_)) | Ok(Err(_)) => EngineHealth::unavailable(),
        Err(_) => {
            warn!(command, "engine version probe timed out");
            EngineHealth::unavailable()
        }
    }
}

/// Streaming engine that spawns the configured command per run and parses
/// JSON events from its stdout.
pub struct CommandStreamingEngine {
    command: String,
}

impl CommandStreamingEngine {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            std::env::var(ENV_ENGINE_COMMAND).unwrap_or_else(|_| ENGINE_COMMAND.to_string()),
        )
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl StreamingEngine for CommandStreamingEngine {
    async fn start(&self, config: &ExecutionConfig) -> Result<EngineRun> {
        let config_file = write_config_file(config)?;
        let mut child = Command::new(&self.command)
            .arg("--config")
            .arg(config_file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::BackendFailure(format!("failed to start {}: {e}", self.command))
            })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            Error::BackendFailure("engine process has no stdout pipe".to_string())
        })?;

        let (tx, rx) = mpsc::channel(64);
        let abort = CancellationToken::new();
        let token = abort.clone();
        let command = self.command.clone();

        tokio::spawn(async move {
            // Keeps the config file on disk until the run ends.
            let _config_file = config_file;
            let mut lines = tokio::io::BufReader::new(stdout).lines();
            let mut sent_terminal = false;

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        if let Err(e) = child.start_kill() {
                            warn!(command, error = %e, "failed to kill aborted engine");
                        }
                        let _ = child.wait().await;
                        return;
                    }
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => {
                            let line = line.trim();
                            if line.is_empty() {
                                continue;
                            }
                            match serde_json::from_str::<TranslateEvent>(line) {
                                Ok(event) => {
                                    sent_terminal |= event.is_terminal();
                                    if tx.send(event).await.is_err() {
                                        let _ = child.start_kill();
                                        let _ = child.wait().await;
                                        return;
                                    }
                                }
                                Err(e) => {
                                    debug!(command, error = %e, "skipping unparseable engine line");
                                }
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            let _ = tx
                                .send(TranslateEvent::Error {
                                    message: format!("engine output read failed: {e}"),
                                })
                                .await;
                            let _ = child.start_kill();
                            let _ = child.wait().await;
                            return;
                        }
                    }
                }
            }

            // Stdout closed: reap the child and surface a silent failure.
            match child.wait().await {
                Ok(status) if !status.success() && !sent_terminal => {
                    let _ = tx
                        .send(TranslateEvent::Error {
                            message: format!("{command} exited with {status}"),
                        })
                        .await;
                }
                Err(e) => {
                    let _ = tx
                        .send(TranslateEvent::Error {
                            message: format!("failed to reap {command}: {e}"),
                        })
                        .await;
                }
                _ => {}
            }
        });

        Ok(EngineRun::new(rx, abort))
    }

    async fn health(&self) -> EngineHealth {
        probe_command(&self.command).await
    }
}

/// Classic engine that runs the configured command to completion, parsing
/// `current/total [stage]` progress lines from its stdout.
pub struct CommandCallbackEngine {
    command: String,
}

impl CommandCallbackEngine {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            std::env::var(ENV_CLASSIC_ENGINE_COMMAND)
                .unwrap_or_else(|_| CLASSIC_ENGINE_COMMAND.to_string()),
        )
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

/// Parse one classic progress line: `current/total`, optionally followed by
/// a stage label. Anything else is engine chatter and ignored.
fn parse_progress_line(line: &str) -> Option<(u64, u64, Option<&str>)> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    let (current, total) = head.split_once('/')?;
    let current = current.parse().ok()?;
    let total = total.parse().ok()?;
    Some((current, total, (!rest.is_empty()).then_some(rest)))
}

#[async_trait]
impl CallbackEngine for CommandCallbackEngine {
    fn translate(
        &self,
        config: &ExecutionConfig,
        progress: &(dyn Fn(u64, u64, Option<&str>) + Send + Sync),
        cancel: &AtomicBool,
    ) -> Result<()> {
        let config_file = write_config_file(config)?;
        let mut child = std::process::Command::new(&self.command)
            .arg("--config")
            .arg(config_file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                Error::BackendFailure(format!("failed to start {}: {e}", self.command))
            })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            Error::BackendFailure("engine process has no stdout pipe".to_string())
        })?;

        // Cancellation is checked between output lines only; a silent engine
        // runs to completion regardless of the flag.
        for line in BufReader::new(stdout).lines() {
            if cancel.load(Ordering::SeqCst) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::BackendFailure("translation aborted".to_string()));
            }
            let line = line
                .map_err(|e| Error::BackendFailure(format!("engine output read failed: {e}")))?;
            if let Some((current, total, stage)) = parse_progress_line(&line) {
                progress(current, total, stage);
            }
        }

        let status = child
            .wait()
            .map_err(|e| Error::BackendFailure(format!("failed to reap {}: {e}", self.command)))?;
        if !status.success() {
            return Err(Error::BackendFailure(format!(
                "{} exited with {status}",
                self.command
            )));
        }
        Ok(())
    }

    async fn health(&self) -> EngineHealth {
        probe_command(&self.command).await
    }
}
