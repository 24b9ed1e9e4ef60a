//! Engine seams: the translation engines consumed as opaque collaborators.
//!
//! Two execution styles exist. A [`StreamingEngine`] produces an ordered
//! event sequence ending in a terminal `Finish` or `Error`; a
//! [`CallbackEngine`] is one blocking call that reports progress through a
//! callback and writes its outputs as a side effect. The backend adapters
//! reconcile both into the uniform job log.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use doctrans_core::{BackendKind, Error, ExecutionConfig, Result};

/// One event from a streaming engine run, in engine order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TranslateEvent {
    /// The engine entered a named stage.
    Stage { stage: String },
    /// Counter update within the current stage.
    Progress {
        current: u64,
        total: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stage: Option<String>,
    },
    /// Free-form engine message.
    Message { text: String },
    /// Terminal success; paths of the artifacts the engine produced.
    Finish {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mono: Option<PathBuf>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dual: Option<PathBuf>,
    },
    /// Terminal failure.
    Error { message: String },
}

impl TranslateEvent {
    /// Whether this event ends the run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finish { .. } | Self::Error { .. })
    }
}

/// Probed engine availability, reported by the config endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineHealth {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl EngineHealth {
    pub fn unavailable() -> Self {
        Self {
            available: false,
            version: None,
        }
    }
}

/// Handle on one in-flight streaming run: the ordered event sequence plus
/// an abort switch.
pub struct EngineRun {
    events: mpsc::Receiver<TranslateEvent>,
    abort: CancellationToken,
}

impl EngineRun {
    pub fn new(events: mpsc::Receiver<TranslateEvent>, abort: CancellationToken) -> Self {
        Self { events, abort }
    }

    /// Next event in engine order; `None` once the engine stops sending.
    pub async fn next_event(&mut self) -> Option<TranslateEvent> {
        self.events.recv().await
    }

    /// Ask the engine to stop. The event sequence ends shortly after; any
    /// events already in flight may still be observed.
    pub fn abort(&self) {
        self.abort.cancel();
    }
}

/// Engine that yields a lazy, ordered event sequence per run.
#[async_trait]
pub trait StreamingEngine: Send + Sync {
    /// Start one translation run for the given configuration.
    async fn start(&self, config: &ExecutionConfig) -> Result<EngineRun>;

    /// Probe the engine for availability and version.
    async fn health(&self) -> EngineHealth;
}

/// Engine driven by one blocking call; runs under `spawn_blocking`.
///
/// `progress` receives `(current, total, stage)` in call order. The engine
/// may poll `cancel` between units of work but is not required to, so
/// cancellation is best-effort for this style.
#[async_trait]
pub trait CallbackEngine: Send + Sync {
    /// Run one translation to completion. Blocking; never call on the
    /// async runtime directly.
    fn translate(
        &self,
        config: &ExecutionConfig,
        progress: &(dyn Fn(u64, u64, Option<&str>) + Send + Sync),
        cancel: &AtomicBool,
    ) -> Result<()>;

    /// Probe the engine for availability and version.
    async fn health(&self) -> EngineHealth;
}

/// The engine pair the orchestrator dispatches to, one per backend kind.
#[derive(Clone)]
pub struct EngineSet {
    pub streaming: Arc<dyn StreamingEngine>,
    pub callback: Arc<dyn CallbackEngine>,
}

impl EngineSet {
    pub fn new(streaming: Arc<dyn StreamingEngine>, callback: Arc<dyn CallbackEngine>) -> Self {
        Self {
            streaming,
            callback,
        }
    }

    /// Probe the engine behind the given backend kind.
    pub async fn health(&self, kind: BackendKind) -> EngineHealth {
        match kind {
            BackendKind::Streaming => self.streaming.health().await,
            BackendKind::Callback => self.callback.health().await,
        }
    }
}

// =============================================================================
// SCRIPTED ENGINES (test doubles)
// =============================================================================

/// Streaming engine double that replays a fixed event script.
pub struct ScriptedStreamingEngine {
    script: Vec<TranslateEvent>,
    step_delay: Duration,
}

impl ScriptedStreamingEngine {
    pub fn new(script: Vec<TranslateEvent>) -> Self {
        Self {
            script,
            step_delay: Duration::ZERO,
        }
    }

    /// Pause between events so tests can observe a run mid-flight.
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Script that reports one progress step then finishes with the given
    /// artifact paths.
    pub fn completing(mono: Option<PathBuf>, dual: Option<PathBuf>) -> Self {
        Self::new(vec![
            TranslateEvent::Stage {
                stage: "translate".to_string(),
            },
            TranslateEvent::Progress {
                current: 1,
                total: 1,
                stage: Some("translate".to_string()),
            },
            TranslateEvent::Finish { mono, dual },
        ])
    }

    /// Script that fails after one stage event.
    pub fn failing(message: &str) -> Self {
        Self::new(vec![
            TranslateEvent::Stage {
                stage: "translate".to_string(),
            },
            TranslateEvent::Error {
                message: message.to_string(),
            },
        ])
    }
}

#[async_trait]
impl StreamingEngine for ScriptedStreamingEngine {
    async fn start(&self, _config: &ExecutionConfig) -> Result<EngineRun> {
        let (tx, rx) = mpsc::channel(16);
        let abort = CancellationToken::new();
        let token = abort.clone();
        let script = self.script.clone();
        let delay = self.step_delay;

        tokio::spawn(async move {
            for event in script {
                if delay > Duration::ZERO {
                    tokio::select! {
                        _ = token.cancelled() => return,
                        _ = tokio::time::sleep(delay) => {}
                    }
                } else if token.is_cancelled() {
                    return;
                }
                if tx.send(event).await.is_err() {
                    return;
                }
            }
        });

        Ok(EngineRun::new(rx, abort))
    }

    async fn health(&self) -> EngineHealth {
        EngineHealth {
            available: true,
            version: Some("scripted".to_string()),
        }
    }
}

/// Callback engine double: reports `steps` progress ticks, then writes a
/// `<stem>-mono.pdf` artifact (and optionally a dual) into the output dir.
pub struct ScriptedCallbackEngine {
    steps: u64,
    step_delay: Duration,
    write_dual: bool,
    fail_with: Option<String>,
    honor_cancel: bool,
}

impl ScriptedCallbackEngine {
    pub fn new(steps: u64) -> Self {
        Self {
            steps,
            step_delay: Duration::ZERO,
            write_dual: false,
            fail_with: None,
            honor_cancel: false,
        }
    }

    /// Sleep between ticks so tests can observe or cancel a run mid-flight.
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn with_dual(mut self) -> Self {
        self.write_dual = true;
        self
    }

    /// Fail after reporting all progress ticks.
    pub fn failing(message: &str) -> Self {
        let mut engine = Self::new(1);
        engine.fail_with = Some(message.to_string());
        engine
    }

    /// Check the cancel flag between ticks and bail out when set.
    pub fn honoring_cancel(mut self) -> Self {
        self.honor_cancel = true;
        self
    }
}

#[async_trait]
impl CallbackEngine for ScriptedCallbackEngine {
    fn translate(
        &self,
        config: &ExecutionConfig,
        progress: &(dyn Fn(u64, u64, Option<&str>) + Send + Sync),
        cancel: &AtomicBool,
    ) -> Result<()> {
        for step in 1..=self.steps {
            if self.honor_cancel && cancel.load(Ordering::SeqCst) {
                return Err(Error::BackendFailure("translation aborted".to_string()));
            }
            if self.step_delay > Duration::ZERO {
                std::thread::sleep(self.step_delay);
            }
            progress(step, self.steps, Some("translate"));
        }

        if let Some(message) = &self.fail_with {
            return Err(Error::BackendFailure(message.clone()));
        }

        let stem = config
            .input_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        std::fs::create_dir_all(&config.output_dir)?;
        std::fs::write(
            config.output_dir.join(format!("{stem}-mono.pdf")),
            b"%PDF-1.4 scripted mono",
        )?;
        if self.write_dual {
            std::fs::write(
                config.output_dir.join(format!("{stem}-dual.pdf")),
                b"%PDF-1.4 scripted dual",
            )?;
        }
        Ok(())
    }

    async fn health(&self) -> EngineHealth {
        EngineHealth {
            available: true,
            version: Some("scripted".to_string()),
        }
    }
}
