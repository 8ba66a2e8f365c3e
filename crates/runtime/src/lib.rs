//! Runtime around the session store: shared state, the commands the
//! presentation layer calls, snapshot DTOs, and the stage job runner.

pub mod commands;
pub mod dto;
pub mod jobs;
pub mod simulate;
pub mod state;

pub use commands::{CommandError, CommandResult};
pub use dto::{HistoryEntry, SessionSnapshot, StageInfo, session_to_snapshot, stage_catalog};
pub use jobs::{JobBackend, JobError, JobOutput, JobProgress, JobRequest, JobRunner, JobTicket};
pub use simulate::{SimulatedBackend, SimulationConfig};
pub use state::{AppState, LockPoisoned};
