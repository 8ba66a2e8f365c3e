//! New-session form: the choices a user makes before production starts.

use crate::model::SessionMeta;
use uuid::Uuid;

pub const GENRES: &[&str] = &[
    "Gospel",
    "Afrobeat",
    "Pop",
    "Hip-Hop",
    "R&B",
    "Jazz",
    "Country",
    "Rock",
    "EDM",
    "Alternative",
    "Worship",
    "Other",
];

pub const PLATFORMS: &[&str] = &["Spotify", "YouTube", "TikTok", "Apple Music"];

pub const STYLES: &[&str] = &["Clean", "Warm", "Punchy", "Spacious"];

pub const DEFAULT_TITLE: &str = "Untitled Session";

/// Where the session's vocal came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Upload { file_name: String },
    /// Completion notice from the capture collaborator, with the playback
    /// reference it handed back, if any.
    Recording { reference: Option<String> },
}

impl AudioSource {
    pub fn display_name(&self) -> &str {
        match self {
            AudioSource::Upload { file_name } => file_name,
            AudioSource::Recording { .. } => "Recorded Vocal",
        }
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            AudioSource::Upload { file_name } => Some(file_name),
            AudioSource::Recording { reference } => reference.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("missing {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDraft {
    pub genre: Option<String>,
    pub platform: Option<String>,
    pub style: Option<String>,
    pub source: Option<AudioSource>,
}

impl SessionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn source(mut self, source: AudioSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn can_start(&self) -> bool {
        self.genre.is_some()
            && self.platform.is_some()
            && self.style.is_some()
            && self.source.is_some()
    }

    /// Builds the session identity with a freshly generated local id.
    pub fn into_meta(self) -> Result<SessionMeta, DraftError> {
        if self.source.is_none() {
            return Err(DraftError::Missing("audio source"));
        }
        Ok(SessionMeta {
            id: local_session_id(),
            title: DEFAULT_TITLE.to_string(),
            genre: self.genre.ok_or(DraftError::Missing("genre"))?,
            platform: self.platform.ok_or(DraftError::Missing("platform"))?,
            style: self.style.ok_or(DraftError::Missing("style"))?,
        })
    }
}

/// `local-<base36 millis>-<hex>`, used until a backend hands out real ids.
pub fn local_session_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let random = Uuid::new_v4().simple().to_string();
    format!("local-{}-{}", to_base36(millis), &random[..12])
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_draft() -> SessionDraft {
        SessionDraft::new()
            .genre("Gospel")
            .platform("YouTube")
            .style("Warm")
            .source(AudioSource::Upload {
                file_name: "take1.wav".to_string(),
            })
    }

    #[test]
    fn test_complete_draft_builds_meta() {
        let draft = complete_draft();
        assert!(draft.can_start());

        let meta = draft.into_meta().expect("meta");
        assert!(meta.id.starts_with("local-"));
        assert_eq!(meta.title, DEFAULT_TITLE);
        assert_eq!(meta.genre, "Gospel");
        assert_eq!(meta.platform, "YouTube");
        assert_eq!(meta.style, "Warm");
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let mut draft = complete_draft();
        draft.style = None;
        assert!(!draft.can_start());
        assert_eq!(draft.into_meta(), Err(DraftError::Missing("style")));

        let mut draft = complete_draft();
        draft.source = None;
        assert_eq!(draft.into_meta(), Err(DraftError::Missing("audio source")));
    }

    #[test]
    fn test_recording_source() {
        let source = AudioSource::Recording { reference: None };
        assert_eq!(source.display_name(), "Recorded Vocal");
        assert!(source.reference().is_none());

        let source = AudioSource::Recording {
            reference: Some("blob:take".to_string()),
        };
        assert_eq!(source.reference(), Some("blob:take"));
    }

    #[test]
    fn test_local_ids_are_unique() {
        assert_ne!(local_session_id(), local_session_id());
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn test_option_lists() {
        assert_eq!(GENRES.len(), 12);
        assert!(PLATFORMS.contains(&"Apple Music"));
        assert!(STYLES.contains(&"Punchy"));
    }
}
