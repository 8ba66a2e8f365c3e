//! Stage refinement jobs.
//!
//! A job is driven through the store as `queued -> processing -> done` (or
//! `failed`). The work itself is delegated to a [`JobBackend`]; every update a
//! job makes is tagged with the stage's generation at submission time, so a
//! job that was cancelled, superseded or reset away can never overwrite a
//! newer result.

use crate::state::{AppState, LockPoisoned};
use antipas_core::{AudioVariant, JobStatus, NewMessage, SessionMeta, Stage, Version};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("{} already has a job in flight", .0.label())]
    Busy(Stage),

    /// Jobs are submitted on behalf of a session; none has been started.
    #[error("No session started")]
    NoSession,

    /// Backend-reported failure; the message is shown to the user as-is.
    #[error("{0}")]
    Failed(String),

    #[error(transparent)]
    Lock(#[from] LockPoisoned),
}

/// What a backend needs to process one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub stage: Stage,
    pub generation: u64,
    pub session: SessionMeta,
    /// Audio of the stage's active version, or the session's source vocal
    /// before the stage has produced any.
    pub audio_ref: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobOutput {
    pub audio_url: Option<String>,
    pub variant: Option<AudioVariant>,
}

/// Where stage audio actually gets processed.
#[async_trait]
pub trait JobBackend: Send + Sync {
    async fn run(
        &self,
        request: JobRequest,
        progress: JobProgress,
    ) -> Result<JobOutput, JobError>;
}

/// Handle a backend uses to report intermediate status for its job.
#[derive(Debug, Clone)]
pub struct JobProgress {
    state: Arc<AppState>,
    stage: Stage,
    generation: u64,
}

impl JobProgress {
    /// Moves the job to `processing`. Returns false if the job is stale.
    pub fn processing(&self) -> bool {
        let Ok(mut store) = self.state.lock() else {
            warn!(stage = %self.stage, "session lock poisoned; dropping progress update");
            return false;
        };
        store.apply_if_current(self.stage, self.generation, |store| {
            store.set_job_status(self.stage, JobStatus::Processing);
        })
    }

    pub fn is_current(&self) -> bool {
        self.state
            .lock()
            .map(|store| store.job_generation(self.stage) == self.generation)
            .unwrap_or(false)
    }
}

/// A submitted job.
#[derive(Debug)]
pub struct JobTicket {
    pub stage: Stage,
    pub generation: u64,
    handle: JoinHandle<()>,
}

impl JobTicket {
    /// Waits for the job task to end. Returns false if it was cancelled.
    pub async fn wait(self) -> bool {
        self.handle.await.is_ok()
    }
}

pub struct JobRunner {
    state: Arc<AppState>,
    backend: Arc<dyn JobBackend>,
    tasks: Mutex<HashMap<Stage, AbortHandle>>,
}

impl JobRunner {
    pub fn new(state: Arc<AppState>, backend: Arc<dyn JobBackend>) -> Self {
        Self {
            state,
            backend,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Starts a refinement job for `stage`.
    ///
    /// Must be called from within a tokio runtime. Switching the active stage
    /// afterwards does not affect the job; it still lands in `stage`.
    pub fn refine(&self, stage: Stage) -> Result<JobTicket, JobError> {
        let request = {
            let mut store = self.state.lock()?;
            let session = store.state().meta().cloned().ok_or(JobError::NoSession)?;
            if store.state().is_busy(stage) {
                return Err(JobError::Busy(stage));
            }

            store.set_stage_error(stage, None);
            store.set_job_status(stage, JobStatus::Queued);
            store.add_message(
                NewMessage::assistant(format!("Got it. I’m refining **{}** now.", stage.label()))
                    .for_stage(stage),
            );

            JobRequest {
                stage,
                generation: store.job_generation(stage),
                session,
                audio_ref: store.state().job_input(stage).map(str::to_string),
            }
        };

        let generation = request.generation;
        info!(%stage, generation, "job queued");

        let progress = JobProgress {
            state: self.state.clone(),
            stage,
            generation,
        };
        let backend = self.backend.clone();
        let state = self.state.clone();
        let handle = tokio::spawn(async move {
            let result = backend.run(request, progress).await;
            finish_job(&state, stage, generation, result);
        });

        self.tasks
            .lock()
            .map_err(|_| LockPoisoned)?
            .insert(stage, handle.abort_handle());

        Ok(JobTicket {
            stage,
            generation,
            handle,
        })
    }

    /// Refines whichever stage is currently active.
    pub fn refine_active(&self) -> Result<JobTicket, JobError> {
        let stage = self.state.lock()?.state().stage();
        self.refine(stage)
    }

    /// Cancels the in-flight job for `stage`, returning it to `idle`.
    ///
    /// Returns false when the stage had nothing in flight.
    pub fn cancel(&self, stage: Stage) -> Result<bool, JobError> {
        if let Some(task) = self.tasks.lock().map_err(|_| LockPoisoned)?.remove(&stage) {
            task.abort();
        }

        let mut store = self.state.lock()?;
        if !store.state().is_busy(stage) {
            return Ok(false);
        }
        let generation = store.invalidate_job(stage);
        store.set_job_status(stage, JobStatus::Idle);
        info!(%stage, generation, "job cancelled");
        Ok(true)
    }
}

fn finish_job(
    state: &AppState,
    stage: Stage,
    generation: u64,
    result: Result<JobOutput, JobError>,
) {
    let Ok(mut store) = state.lock() else {
        warn!(%stage, generation, "session lock poisoned; dropping job result");
        return;
    };

    let applied = store.apply_if_current(stage, generation, |store| match result {
        Ok(output) => {
            let now = chrono::Utc::now();
            let number = store.state().next_version_number(stage);
            let version = Version {
                id: format!("{stage}-{}-{generation}", now.timestamp_millis()),
                stage,
                label: format!("{} v{number}", stage.label()),
                created_at: now.to_rfc3339(),
                audio_url: output.audio_url,
                variant: output.variant,
            };
            info!(%stage, generation, version = %version.id, "job done");
            store.add_version(version);
            store.set_job_status(stage, JobStatus::Done);
        }
        Err(error) => {
            warn!(%stage, generation, %error, "job failed");
            store.set_stage_error(stage, Some(error.to_string()));
        }
    });

    if !applied {
        warn!(%stage, generation, "stale job result discarded");
    }
}
