use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a production session as the backend will know it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub id: String,
    pub title: String,
    pub genre: String,
    pub platform: String,
    pub style: String,
}

impl SessionMeta {
    /// Metadata for a session opened directly by id, before the backend can
    /// supply the real values.
    pub fn placeholder(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: format!("Project {id}"),
            id,
            genre: "Afrobeat".to_string(),
            platform: "Spotify".to_string(),
            style: "Punchy".to_string(),
        }
    }

    /// "Genre · Platform · Style" subtitle.
    pub fn subtitle(&self) -> String {
        format!("{} · {} · {}", self.genre, self.platform, self.style)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Idle,
    Queued,
    Processing,
    Done,
    Failed,
}

impl JobStatus {
    /// A job is in flight; refine stays disabled until it settles.
    pub fn is_busy(self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Processing)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobStatus::Idle => "idle",
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AudioVariant {
    #[default]
    A,
    B,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant '{0}' (expected A or B)")]
pub struct ParseVariantError(pub String);

impl std::str::FromStr for AudioVariant {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(AudioVariant::A),
            "B" | "b" => Ok(AudioVariant::B),
            other => Err(ParseVariantError(other.to_string())),
        }
    }
}

/// One produced artifact for a stage. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: String,
    pub stage: Stage,
    pub label: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<AudioVariant>,
}

impl Version {
    pub fn new(
        id: impl Into<String>,
        stage: Stage,
        label: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            stage,
            label: label.into(),
            created_at: created_at.into(),
            audio_url: None,
            variant: None,
        }
    }

    pub fn with_audio_url(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    pub fn with_variant(mut self, variant: AudioVariant) -> Self {
        self.variant = Some(variant);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Assistant => "assistant",
            Role::User => "user",
            Role::System => "system",
        })
    }
}

/// Entry in the producer chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
    /// Unix milliseconds.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
}

/// Caller-supplied part of a message; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub role: Role,
    pub text: String,
    pub stage: Option<Stage>,
}

impl NewMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            stage: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn for_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_meta() {
        let meta = SessionMeta::placeholder("42");
        assert_eq!(meta.id, "42");
        assert_eq!(meta.title, "Project 42");
        assert_eq!(meta.subtitle(), "Afrobeat · Spotify · Punchy");
    }

    #[test]
    fn test_job_status_busy() {
        assert!(JobStatus::Queued.is_busy());
        assert!(JobStatus::Processing.is_busy());
        assert!(!JobStatus::Idle.is_busy());
        assert!(!JobStatus::Failed.is_busy());
    }

    #[test]
    fn test_variant_parse() {
        assert_eq!("b".parse::<AudioVariant>(), Ok(AudioVariant::B));
        assert!("C".parse::<AudioVariant>().is_err());
    }

    #[test]
    fn test_version_json_skips_missing_optionals() {
        let version = Version::new("raw-1", Stage::Raw, "Raw Enhancement v1", "t0");
        let json = serde_json::to_value(&version).expect("serialize");

        assert_eq!(json["createdAt"], "t0");
        assert_eq!(json["stage"], "raw");
        assert!(json.get("audioUrl").is_none());
        assert!(json.get("variant").is_none());
    }

    #[test]
    fn test_version_json_with_optionals() {
        let version = Version::new("mix-1", Stage::Mix, "Mix Balance v1", "t1")
            .with_audio_url("blob:local/1")
            .with_variant(AudioVariant::B);
        let json = serde_json::to_value(&version).expect("serialize");

        assert_eq!(json["audioUrl"], "blob:local/1");
        assert_eq!(json["variant"], "B");
    }
}
