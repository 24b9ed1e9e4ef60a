//! Streaming adapter: consumes an engine's lazy ordered event sequence.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use doctrans_core::{Artifacts, BackendKind, Error, ExecutionConfig, ProgressEvent, Result};

use crate::adapters::{AdapterContext, BackendAdapter, RunOutcome};
use crate::engine::{StreamingEngine, TranslateEvent};

pub struct StreamingAdapter {
    engine: Arc<dyn StreamingEngine>,
}

impl StreamingAdapter {
    pub fn new(engine: Arc<dyn StreamingEngine>) -> Self {
        Self { engine }
    }
}

/// Map a non-terminal engine event onto the job-log vocabulary.
fn forward(event: TranslateEvent) -> ProgressEvent {
    match event {
        TranslateEvent::Stage { stage } => ProgressEvent::Stage { name: stage },
        TranslateEvent::Progress {
            current,
            total,
            stage,
        } => ProgressEvent::Progress {
            current,
            total,
            stage,
        },
        TranslateEvent::Message { text } => ProgressEvent::Message { text },
        // Terminal events are consumed by the run loop before forwarding.
        TranslateEvent::Finish { .. } => ProgressEvent::Finished,
        TranslateEvent::Error { message } => ProgressEvent::Message { text: message },
    }
}

#[async_trait]
impl BackendAdapter for StreamingAdapter {
    fn backend(&self) -> BackendKind {
        BackendKind::Streaming
    }

    #[instrument(
        skip(self, ctx, config),
        fields(subsystem = "jobs", component = "streaming", op = "run", job_id = %ctx.job_id)
    )]
    async fn run(&self, ctx: &AdapterContext, config: Arc<ExecutionConfig>) -> Result<RunOutcome> {
        let mut run = self.engine.start(&config).await?;

        loop {
            tokio::select! {
                _ = ctx.cancel.cancelled() => {
                    run.abort();
                    return Ok(RunOutcome::Cancelled);
                }
                event = run.next_event() => match event {
                    Some(TranslateEvent::Finish { mono, dual }) => {
                        ctx.emit(ProgressEvent::Finished).await?;
                        return Ok(RunOutcome::Completed(Artifacts { mono, dual }));
                    }
                    Some(TranslateEvent::Error { message }) => {
                        return Err(Error::BackendFailure(message));
                    }
                    Some(event) => ctx.emit(forward(event)).await?,
                    None => {
                        return Err(Error::BackendFailure(
                            "engine stream ended without a result".to_string(),
                        ));
                    }
                }
            }
        }
    }
}
