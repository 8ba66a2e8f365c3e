//! Data Transfer Objects (DTOs) handed to the presentation layer.
//!
//! These types are serialized to JSON and represent snapshots of the
//! session state at a point in time.

use antipas_core::{
    AudioVariant, JobStatus, ProducerMessage, SessionMeta, SessionState, Stage, Version,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Complete snapshot of the session state.
///
/// Returned by every command so the view never needs a separate
/// `get_state` round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub meta: Option<SessionMeta>,
    pub stage: Stage,
    pub active_variant: AudioVariant,
    pub job_status_by_stage: BTreeMap<Stage, JobStatus>,
    pub error_by_stage: BTreeMap<Stage, String>,
    pub versions: Vec<Version>,
    pub active_version_id_by_stage: BTreeMap<Stage, String>,
    pub messages: Vec<ProducerMessage>,
    /// Playback URL of the active version for the current stage.
    pub current_audio_url: Option<String>,
    /// Refine is disabled while the current stage has a job in flight.
    pub busy: bool,
    pub history: Vec<HistoryEntry>,
}

/// Row in the version history drawer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub label: String,
    /// Human stage name, e.g. "Mix Balance".
    pub stage: String,
    pub created_at: String,
}

/// One stage tab plus its producer prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageInfo {
    pub key: Stage,
    pub title: String,
    pub description: String,
    pub prompt: String,
    pub options: Vec<String>,
}

/// Convert the store's state into a SessionSnapshot.
pub fn session_to_snapshot(state: &SessionState) -> SessionSnapshot {
    let stage = state.stage();

    SessionSnapshot {
        meta: state.meta().cloned(),
        stage,
        active_variant: state.active_variant(),
        job_status_by_stage: state
            .job_statuses()
            .iter()
            .map(|(stage, status)| (stage, *status))
            .collect(),
        error_by_stage: state
            .stage_errors()
            .iter()
            .filter_map(|(stage, error)| error.clone().map(|e| (stage, e)))
            .collect(),
        versions: state.versions().to_vec(),
        active_version_id_by_stage: state
            .active_version_ids()
            .iter()
            .filter_map(|(stage, id)| id.clone().map(|id| (stage, id)))
            .collect(),
        messages: state.messages().to_vec(),
        current_audio_url: state.current_audio_url(stage).map(str::to_string),
        busy: state.is_busy(stage),
        history: state
            .versions()
            .iter()
            .map(|version| HistoryEntry {
                id: version.id.clone(),
                label: version.label.clone(),
                stage: version.stage.label().to_string(),
                created_at: version.created_at.clone(),
            })
            .collect(),
    }
}

pub fn stage_catalog() -> Vec<StageInfo> {
    Stage::ALL
        .into_iter()
        .map(|stage| {
            let coaching = stage.coaching();
            StageInfo {
                key: stage,
                title: stage.tab_title(),
                description: stage.description().to_string(),
                prompt: coaching.prompt.to_string(),
                options: coaching.options.iter().map(|o| o.to_string()).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use antipas_core::SessionStore;

    #[test]
    fn test_snapshot_of_fresh_session() {
        let store = SessionStore::new();
        let snapshot = session_to_snapshot(store.state());

        assert!(snapshot.meta.is_none());
        assert_eq!(snapshot.stage, Stage::Raw);
        assert_eq!(snapshot.job_status_by_stage.len(), 4);
        assert!(snapshot.error_by_stage.is_empty());
        assert!(snapshot.active_version_id_by_stage.is_empty());
        assert_eq!(snapshot.messages.len(), 1);
        assert!(!snapshot.busy);
    }

    #[test]
    fn test_snapshot_json_uses_camel_case_keys() {
        let mut store = SessionStore::new();
        store.set_stage_error(Stage::Mix, Some("Processing failed.".to_string()));
        store.add_version(Version::new("raw-1", Stage::Raw, "Raw Enhancement v1", "t0"));

        let json = serde_json::to_value(session_to_snapshot(store.state())).expect("serialize");

        assert_eq!(json["activeVariant"], "A");
        assert_eq!(json["jobStatusByStage"]["mix"], "failed");
        assert_eq!(json["jobStatusByStage"]["raw"], "idle");
        assert_eq!(json["errorByStage"]["mix"], "Processing failed.");
        assert_eq!(json["activeVersionIdByStage"]["raw"], "raw-1");
        assert_eq!(json["history"][0]["stage"], "Raw Enhancement");
        assert_eq!(json["history"][0]["createdAt"], "t0");
    }

    #[test]
    fn test_snapshot_busy_tracks_current_stage() {
        let mut store = SessionStore::new();
        store.set_job_status(Stage::Mix, JobStatus::Processing);
        assert!(!session_to_snapshot(store.state()).busy);

        store.set_stage(Stage::Mix);
        assert!(session_to_snapshot(store.state()).busy);
    }

    #[test]
    fn test_stage_catalog() {
        let catalog = stage_catalog();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog[1].title, "2. Mix Balance");
        assert_eq!(catalog[3].prompt, "Pick export target");
        assert_eq!(catalog[0].options[0], "Brighter");
    }
}
