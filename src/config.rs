use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use which::which;

use crate::{default_health_alerts, write_json_atomically, CareError, ReminderEntry, ReminderTable, Result};

/// Environment variable that overrides the text-to-speech command
pub const SPEECH_COMMAND_ENV: &str = "CAREVOX_TTS";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Backing file for appointments
    pub appointments_file: PathBuf,

    /// Whether announcements are spoken aloud
    pub speech_enabled: bool,

    /// Text-to-speech command line; the text is appended as the last argument
    pub speech_command: Option<String>,

    /// Seconds between two scans of the reminder table
    pub reminder_interval_secs: u64,

    /// Daily reminders, spoken when the clock shows their time
    pub health_alerts: Vec<ReminderEntry>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            appointments_file: data_dir.join("appointments.json"),
            speech_enabled: true,
            speech_command: None,
            reminder_interval_secs: 60,
            health_alerts: default_health_alerts(),
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "carevox")
}

impl Config {
    /// Where the configuration lives when `--config` is not given
    pub fn default_path() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("carevox.json"))
    }

    /// Reads the configuration at `path`, or the defaults when there is none.
    ///
    /// Unlike the appointment file, a malformed configuration is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content).map_err(|e| CareError::ConfigError {
            message: format!("{}: {}", path.display(), e),
        })?;
        config.validate()?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        write_json_atomically(path, self)?;
        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Checks the values a running dispatcher depends on
    pub fn validate(&self) -> Result<()> {
        if self.reminder_interval_secs == 0 {
            return Err(CareError::ConfigError {
                message: "reminder_interval_secs must be greater than 0".to_string(),
            });
        }
        self.reminder_table()?;
        Ok(())
    }

    pub fn reminder_table(&self) -> Result<ReminderTable> {
        ReminderTable::new(self.health_alerts.clone())
    }

    pub fn reminder_interval(&self) -> Duration {
        Duration::from_secs(self.reminder_interval_secs)
    }

    // This method provides smart fallbacks when no speech engine is configured
    pub fn get_speech_command(&self) -> Option<String> {
        // First try the configured command
        if let Some(command) = &self.speech_command {
            return Some(command.clone());
        }

        // Then try environment variable
        if let Ok(command) = std::env::var(SPEECH_COMMAND_ENV) {
            if !command.trim().is_empty() {
                return Some(command);
            }
        }

        // Fall back to platform defaults
        let candidates: &[&str] = if cfg!(target_os = "macos") {
            &["say"]
        } else {
            &["espeak-ng", "espeak", "spd-say"]
        };

        candidates
            .iter()
            .find(|engine| which(engine).is_ok())
            .map(|engine| engine.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = Config::load(&temp.path().join("config.json")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.reminder_interval_secs, 60);
        assert_eq!(config.health_alerts.len(), 10);
    }

    #[test]
    fn test_partial_config_fills_in_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{ "speech_enabled": false }"#).unwrap();

        let config = Config::load(&path).unwrap();

        assert!(!config.speech_enabled);
        assert_eq!(config.reminder_interval_secs, 60);
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        let config = Config {
            appointments_file: temp.path().join("appts.json"),
            speech_command: Some("espeak -s 120".to_string()),
            health_alerts: vec![ReminderEntry::new("09:15 PM", "Lights out")],
            ..Config::default()
        };

        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "speech_enabled = false").unwrap();

        assert!(matches!(
            Config::load(&path),
            Err(CareError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_interval = Config {
            reminder_interval_secs: 0,
            ..Config::default()
        };
        assert!(zero_interval.validate().is_err());

        let unpadded = Config {
            health_alerts: vec![ReminderEntry::new("8:00 AM", "Drink water")],
            ..Config::default()
        };
        assert!(matches!(
            unpadded.validate(),
            Err(CareError::InvalidTriggerTime { .. })
        ));
    }

    #[test]
    fn test_configured_speech_command_wins() {
        let config = Config {
            speech_command: Some("say -v Samantha".to_string()),
            ..Config::default()
        };
        assert_eq!(config.get_speech_command().as_deref(), Some("say -v Samantha"));
    }
}
