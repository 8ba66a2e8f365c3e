use crate::draft::AudioSource;
use crate::model::{
    AudioVariant, JobStatus, NewMessage, ProducerMessage, Role, SessionMeta, Version,
};
use crate::stage::{Stage, StageMap};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

pub const WELCOME_MESSAGE_ID: &str = "sys-1";
pub const WELCOME_MESSAGE: &str =
    "Welcome. Upload/record a vocal and we’ll refine it step-by-step.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("version '{0}' not found")]
    NotFound(String),

    #[error("version '{version_id}' belongs to stage {actual}, not {expected}")]
    StageMismatch {
        version_id: String,
        expected: Stage,
        actual: Stage,
    },
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Everything the presentation layer reads about one production session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    meta: Option<SessionMeta>,
    source: Option<AudioSource>,
    stage: Stage,
    active_variant: AudioVariant,
    job_status: StageMap<JobStatus>,
    errors: StageMap<Option<String>>,
    versions: Vec<Version>,
    active_versions: StageMap<Option<String>>,
    messages: Vec<ProducerMessage>,
}

impl SessionState {
    fn initial() -> Self {
        Self {
            meta: None,
            source: None,
            stage: Stage::Raw,
            active_variant: AudioVariant::A,
            job_status: StageMap::filled(JobStatus::Idle),
            errors: StageMap::default(),
            versions: Vec::new(),
            active_versions: StageMap::default(),
            messages: vec![ProducerMessage {
                id: WELCOME_MESSAGE_ID.to_string(),
                role: Role::System,
                text: WELCOME_MESSAGE.to_string(),
                created_at: now_millis(),
                stage: None,
            }],
        }
    }

    pub fn meta(&self) -> Option<&SessionMeta> {
        self.meta.as_ref()
    }

    /// The vocal the session was started from.
    pub fn source(&self) -> Option<&AudioSource> {
        self.source.as_ref()
    }

    /// Audio a new job for `stage` should start from: the stage's active
    /// version if it has audio, otherwise the session's source vocal.
    pub fn job_input(&self, stage: Stage) -> Option<&str> {
        self.current_audio_url(stage)
            .or_else(|| self.source.as_ref().and_then(AudioSource::reference))
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn active_variant(&self) -> AudioVariant {
        self.active_variant
    }

    pub fn job_status(&self, stage: Stage) -> JobStatus {
        self.job_status[stage]
    }

    pub fn job_statuses(&self) -> &StageMap<JobStatus> {
        &self.job_status
    }

    pub fn stage_error(&self, stage: Stage) -> Option<&str> {
        self.errors[stage].as_deref()
    }

    pub fn stage_errors(&self) -> &StageMap<Option<String>> {
        &self.errors
    }

    pub fn is_busy(&self, stage: Stage) -> bool {
        self.job_status[stage].is_busy()
    }

    /// Newest first.
    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn version(&self, id: &str) -> Option<&Version> {
        self.versions.iter().find(|v| v.id == id)
    }

    pub fn versions_for(&self, stage: Stage) -> impl Iterator<Item = &Version> {
        self.versions.iter().filter(move |v| v.stage == stage)
    }

    /// Number the next version produced for `stage` should carry in its label.
    pub fn next_version_number(&self, stage: Stage) -> usize {
        self.versions_for(stage).count() + 1
    }

    pub fn active_version_id(&self, stage: Stage) -> Option<&str> {
        self.active_versions[stage].as_deref()
    }

    pub fn active_version_ids(&self) -> &StageMap<Option<String>> {
        &self.active_versions
    }

    pub fn active_version(&self, stage: Stage) -> Option<&Version> {
        self.active_version_id(stage).and_then(|id| self.version(id))
    }

    /// Playback URL of the active version, once a backend supplies one.
    pub fn current_audio_url(&self, stage: Stage) -> Option<&str> {
        self.active_version(stage)
            .and_then(|v| v.audio_url.as_deref())
    }

    pub fn messages(&self) -> &[ProducerMessage] {
        &self.messages
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Listener = Box<dyn Fn(&SessionState) + Send + Sync>;

/// Owner of one session's state. All writes go through the methods below and
/// every write notifies subscribers before returning.
pub struct SessionStore {
    state: SessionState,
    generations: StageMap<u64>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            state: SessionState::initial(),
            generations: StageMap::filled(0),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn subscribe(
        &mut self,
        listener: impl Fn(&SessionState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn notify(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.state);
        }
    }

    pub fn set_meta(&mut self, meta: SessionMeta) {
        debug!(session = %meta.id, "set meta");
        self.state.meta = Some(meta);
        self.notify();
    }

    pub fn set_source(&mut self, source: AudioSource) {
        debug!(source = source.display_name(), "set source");
        self.state.source = Some(source);
        self.notify();
    }

    pub fn set_stage(&mut self, stage: Stage) {
        debug!(%stage, "set stage");
        self.state.stage = stage;
        self.state.active_variant = AudioVariant::A;
        self.state.errors[stage] = None;
        self.notify();
    }

    pub fn set_variant(&mut self, variant: AudioVariant) {
        debug!(?variant, "set variant");
        self.state.active_variant = variant;
        self.notify();
    }

    /// Transitions are not validated. Entering `Queued` starts a new job
    /// generation for the stage.
    pub fn set_job_status(&mut self, stage: Stage, status: JobStatus) {
        if status == JobStatus::Queued {
            self.generations[stage] += 1;
        }
        debug!(%stage, %status, generation = self.generations[stage], "set job status");
        self.state.job_status[stage] = status;
        self.notify();
    }

    /// A message forces the stage to `Failed`; clearing leaves the status alone.
    /// An empty message counts as clearing.
    pub fn set_stage_error(&mut self, stage: Stage, message: Option<String>) {
        let message = message.filter(|m| !m.is_empty());
        debug!(%stage, error = ?message, "set stage error");
        if message.is_some() {
            self.state.job_status[stage] = JobStatus::Failed;
        }
        self.state.errors[stage] = message;
        self.notify();
    }

    /// Prepends `version` and makes it the active one for its stage. Ids are
    /// not deduplicated.
    pub fn add_version(&mut self, version: Version) {
        debug!(stage = %version.stage, id = %version.id, "add version");
        self.state.active_versions[version.stage] = Some(version.id.clone());
        self.state.versions.insert(0, version);
        self.notify();
    }

    pub fn set_active_version(&mut self, stage: Stage, version_id: &str) -> Result<(), StoreError> {
        let version = self
            .state
            .version(version_id)
            .ok_or_else(|| StoreError::NotFound(version_id.to_string()))?;
        if version.stage != stage {
            return Err(StoreError::StageMismatch {
                version_id: version_id.to_string(),
                expected: stage,
                actual: version.stage,
            });
        }

        debug!(%stage, id = version_id, "set active version");
        self.state.active_versions[stage] = Some(version_id.to_string());
        self.notify();
        Ok(())
    }

    /// Appends a message and returns the id the store assigned to it.
    pub fn add_message(&mut self, message: NewMessage) -> String {
        let created_at = now_millis();
        let id = format!("{}-{}-{}", message.role, created_at, Uuid::new_v4().simple());
        debug!(role = %message.role, id = %id, "add message");
        self.state.messages.push(ProducerMessage {
            id: id.clone(),
            role: message.role,
            text: message.text,
            created_at,
            stage: message.stage,
        });
        self.notify();
        id
    }

    /// Back to the initial state. In-flight jobs from before the reset are
    /// invalidated.
    pub fn reset_session(&mut self) {
        debug!("reset session");
        for stage in Stage::ALL {
            self.generations[stage] += 1;
        }
        self.state = SessionState::initial();
        self.notify();
    }

    pub fn job_generation(&self, stage: Stage) -> u64 {
        self.generations[stage]
    }

    /// Makes any in-flight job for `stage` stale without touching its status.
    pub fn invalidate_job(&mut self, stage: Stage) -> u64 {
        self.generations[stage] += 1;
        debug!(%stage, generation = self.generations[stage], "invalidate job");
        self.generations[stage]
    }

    /// Runs `apply` only if `generation` is still the stage's current job.
    pub fn apply_if_current(
        &mut self,
        stage: Stage,
        generation: u64,
        apply: impl FnOnce(&mut Self),
    ) -> bool {
        if self.generations[stage] != generation {
            debug!(
                %stage,
                generation,
                current = self.generations[stage],
                "dropping stale job update"
            );
            return false;
        }
        apply(self);
        true
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state)
            .field("generations", &self.generations)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
