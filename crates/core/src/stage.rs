use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// One of the four phases of the production pipeline, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Raw,
    Mix,
    Coach,
    Master,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Raw, Stage::Mix, Stage::Coach, Stage::Master];

    pub fn index(self) -> usize {
        match self {
            Stage::Raw => 0,
            Stage::Mix => 1,
            Stage::Coach => 2,
            Stage::Master => 3,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Stage::Raw => "raw",
            Stage::Mix => "mix",
            Stage::Coach => "coach",
            Stage::Master => "master",
        }
    }

    /// Human name used in version labels and assistant messages.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Raw => "Raw Enhancement",
            Stage::Mix => "Mix Balance",
            Stage::Coach => "Performance Coaching",
            Stage::Master => "Mastering",
        }
    }

    /// Numbered title shown on the stage tabs.
    pub fn tab_title(self) -> String {
        format!("{}. {}", self.index() + 1, self.label())
    }

    pub fn description(self) -> &'static str {
        match self {
            Stage::Raw => "Clean + normalize + light correction.",
            Stage::Mix => "Vocal placement + tone + space.",
            Stage::Coach => "Pitch/timing/energy notes.",
            Stage::Master => "Platform loudness + final polish.",
        }
    }

    pub fn next(self) -> Option<Stage> {
        Stage::ALL.get(self.index() + 1).copied()
    }

    pub fn coaching(self) -> CoachingPrompt {
        match self {
            Stage::Raw => CoachingPrompt {
                prompt: "Does the vocal feel clear enough?",
                options: &["Brighter", "Warmer", "More natural", "Stronger correction"],
            },
            Stage::Mix => CoachingPrompt {
                prompt: "How does the vocal sit in the mix?",
                options: &["Too forward", "Too buried", "Too sharp", "Too soft"],
            },
            Stage::Coach => CoachingPrompt {
                prompt: "Coaching actions",
                options: &["Keep as is", "Light correction", "Strong correction", "Re-record"],
            },
            Stage::Master => CoachingPrompt {
                prompt: "Pick export target",
                options: &["Spotify", "YouTube", "TikTok", "Apple Music"],
            },
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stage '{0}' (expected raw, mix, coach or master)")]
pub struct ParseStageError(pub String);

impl FromStr for Stage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseStageError(s.to_string()))
    }
}

/// Quick-reply question the producer panel offers for a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoachingPrompt {
    pub prompt: &'static str,
    pub options: &'static [&'static str],
}

/// Fixed-size map holding exactly one value per stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StageMap<T> {
    slots: [T; 4],
}

impl<T> StageMap<T> {
    pub fn from_fn(mut f: impl FnMut(Stage) -> T) -> Self {
        Self {
            slots: Stage::ALL.map(&mut f),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stage, &T)> {
        Stage::ALL.into_iter().zip(self.slots.iter())
    }
}

impl<T: Clone> StageMap<T> {
    pub fn filled(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }
}

impl<T> Index<Stage> for StageMap<T> {
    type Output = T;

    fn index(&self, stage: Stage) -> &T {
        &self.slots[stage.index()]
    }
}

impl<T> IndexMut<Stage> for StageMap<T> {
    fn index_mut(&mut self, stage: Stage) -> &mut T {
        &mut self.slots[stage.index()]
    }
}
