//! Commands for session control.
//!
//! These functions are what the presentation layer calls. Each command
//! locks the AppState, performs an operation on the store, and returns a
//! SessionSnapshot to keep the view in sync.

use crate::dto::{SessionSnapshot, session_to_snapshot};
use crate::jobs::{JobError, JobRunner, JobTicket};
use crate::state::{AppState, LockPoisoned};
use antipas_core::{
    AudioVariant, DraftError, NewMessage, SessionDraft, SessionMeta, Stage, StoreError,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Lock(#[from] LockPoisoned),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Cannot start session: {0}")]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Job(#[from] JobError),
}

pub type CommandResult<T> = Result<T, CommandError>;

// ============================================================================
// Session Commands
// ============================================================================

/// Start a fresh session from the new-session form.
pub fn session_start(draft: SessionDraft, state: &AppState) -> CommandResult<SessionSnapshot> {
    let source = draft.source.clone();
    let meta = draft.into_meta()?;

    let mut store = state.lock()?;
    store.reset_session();
    store.set_meta(meta);
    if let Some(source) = source {
        store.set_source(source);
    }
    Ok(session_to_snapshot(store.state()))
}

/// Open a session by id. Metadata already present is kept.
pub fn session_open(id: &str, state: &AppState) -> CommandResult<SessionSnapshot> {
    let mut store = state.lock()?;
    if store.state().meta().is_none() {
        store.set_meta(SessionMeta::placeholder(id));
    }
    Ok(session_to_snapshot(store.state()))
}

/// Get the current session state without modifying it.
pub fn session_get_state(state: &AppState) -> CommandResult<SessionSnapshot> {
    let store = state.lock()?;
    Ok(session_to_snapshot(store.state()))
}

pub fn session_reset(state: &AppState) -> CommandResult<SessionSnapshot> {
    let mut store = state.lock()?;
    store.reset_session();
    Ok(session_to_snapshot(store.state()))
}

// ============================================================================
// Stage Commands
// ============================================================================

/// Switch to another stage tab.
pub fn stage_select(stage: Stage, state: &AppState) -> CommandResult<SessionSnapshot> {
    let mut store = state.lock()?;
    store.set_stage(stage);
    Ok(session_to_snapshot(store.state()))
}

/// Start refining the active stage.
pub fn stage_refine(runner: &JobRunner) -> CommandResult<JobTicket> {
    Ok(runner.refine_active()?)
}

/// Cancel the active stage's job, if it has one.
pub fn stage_cancel(runner: &JobRunner) -> CommandResult<SessionSnapshot> {
    let stage = runner.state().lock()?.state().stage();
    runner.cancel(stage)?;
    session_get_state(runner.state())
}

// ============================================================================
// Playback Commands
// ============================================================================

pub fn variant_select(variant: AudioVariant, state: &AppState) -> CommandResult<SessionSnapshot> {
    let mut store = state.lock()?;
    store.set_variant(variant);
    Ok(session_to_snapshot(store.state()))
}

/// Pick a version from the history for the active stage.
pub fn version_select(version_id: &str, state: &AppState) -> CommandResult<SessionSnapshot> {
    let mut store = state.lock()?;
    let stage = store.state().stage();
    store.set_active_version(stage, version_id)?;
    Ok(session_to_snapshot(store.state()))
}

// ============================================================================
// Producer Commands
// ============================================================================

/// Post a user reply (usually a quick-reply option) for the active stage.
pub fn message_send(text: &str, state: &AppState) -> CommandResult<SessionSnapshot> {
    let mut store = state.lock()?;
    let stage = store.state().stage();
    store.add_message(NewMessage::user(text).for_stage(stage));
    Ok(session_to_snapshot(store.state()))
}
