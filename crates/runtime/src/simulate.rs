//! Fixed-delay stand-in for the processing backend.

use crate::jobs::{JobBackend, JobError, JobOutput, JobProgress, JobRequest};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_FAILURE_MESSAGE: &str = "Processing failed. Please retry.";

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Time from submission until the job reports `processing`.
    pub processing_after: Duration,
    /// Time from submission until the job completes.
    pub complete_after: Duration,
    /// Probability in `0.0..=1.0` that a job fails.
    pub failure_rate: f64,
    pub failure_message: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            processing_after: Duration::from_millis(350),
            complete_after: Duration::from_millis(1400),
            failure_rate: 0.0,
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Produces versions without audio after fixed delays.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend {
    config: SimulationConfig,
}

impl SimulatedBackend {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    fn should_fail(&self) -> bool {
        let rate = self.config.failure_rate.clamp(0.0, 1.0);
        rate > 0.0 && rand::random::<f64>() < rate
    }
}

#[async_trait]
impl JobBackend for SimulatedBackend {
    async fn run(
        &self,
        request: JobRequest,
        progress: JobProgress,
    ) -> Result<JobOutput, JobError> {
        let processing_after = self.config.processing_after;
        tokio::time::sleep(processing_after).await;
        if !progress.processing() {
            debug!(
                stage = %request.stage,
                generation = request.generation,
                "simulated job superseded"
            );
            return Ok(JobOutput::default());
        }

        tokio::time::sleep(self.config.complete_after.saturating_sub(processing_after)).await;
        if !progress.is_current() {
            return Ok(JobOutput::default());
        }
        if self.should_fail() {
            return Err(JobError::Failed(self.config.failure_message.clone()));
        }
        Ok(JobOutput::default())
    }
}
