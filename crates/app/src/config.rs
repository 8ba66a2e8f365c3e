use antipas_runtime::SimulationConfig;
use antipas_runtime::simulate::DEFAULT_FAILURE_MESSAGE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub session: SessionDefaults,
}

/// Timing and failure behaviour of the simulated job backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    pub processing_after_ms: u64,
    pub complete_after_ms: u64,
    pub failure_rate: f64,
    pub failure_message: String,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            processing_after_ms: 350,
            complete_after_ms: 1400,
            failure_rate: 0.0,
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// Form values used when the command line leaves them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    pub genre: String,
    pub platform: String,
    pub style: String,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            genre: "Afrobeat".to_string(),
            platform: "Spotify".to_string(),
            style: "Punchy".to_string(),
        }
    }
}

impl Config {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("antipas").join("config.toml"))
    }

    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Missing or unreadable files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!(path = %path.display(), %err, "no config file, using defaults");
                return Self::default();
            }
        };

        match toml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), %err, "invalid config file, using defaults");
                Self::default()
            }
        }
    }

    pub fn simulation(&self) -> SimulationConfig {
        SimulationConfig {
            processing_after: Duration::from_millis(self.jobs.processing_after_ms),
            complete_after: Duration::from_millis(self.jobs.complete_after_ms),
            failure_rate: self.jobs.failure_rate.clamp(0.0, 1.0),
            failure_message: self.jobs.failure_message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().expect("tempdir");
        let config = Config::load_from(&dir.path().join("absent.toml"));
        assert_eq!(config, Config::default());
        assert_eq!(config.simulation(), SimulationConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[jobs]\ncomplete_after_ms = 50\nfailure_rate = 2.5\n\n[session]\ngenre = \"Jazz\"\n",
        )
        .expect("write");

        let config = Config::load_from(&path);
        assert_eq!(config.jobs.complete_after_ms, 50);
        assert_eq!(config.jobs.processing_after_ms, 350);
        assert_eq!(config.session.genre, "Jazz");
        assert_eq!(config.session.platform, "Spotify");

        let simulation = config.simulation();
        assert_eq!(simulation.complete_after, Duration::from_millis(50));
        assert_eq!(simulation.failure_rate, 1.0);
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "jobs = [not toml").expect("write");

        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.jobs.failure_message = "Try again.".to_string();

        let text = toml::to_string_pretty(&config).expect("serialize");
        let parsed: Config = toml::from_str(&text).expect("parse");
        assert_eq!(parsed, config);
    }
}
