use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::review::{ReviewMode, WordFilter};
use crate::timer::CueSettings;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the study-tracker API; the local database is used when unset.
    pub api_url: Option<String>,
    pub voice: bool,
    pub beep: bool,
    /// Text-to-speech program; the platform default when unset.
    pub speech_command: Option<String>,
    pub review_mode: ReviewMode,
    pub word_filter: WordFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            voice: true,
            beep: true,
            speech_command: None,
            review_mode: ReviewMode::default(),
            word_filter: WordFilter::default(),
        }
    }
}

impl Config {
    pub fn cue_settings(&self) -> CueSettings {
        CueSettings {
            voice: self.voice,
            chime: self.beep,
        }
    }

    pub fn speech_command(&self) -> String {
        self.speech_command
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| crate::timer::SpeechAnnouncer::default_command().to_string())
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_dir()
            .map(|dir| dir.join("config.json"))
            .unwrap_or_else(|| PathBuf::from("engtrack_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!("ignoring config {:?}: {}", self.path, e),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = Config {
            api_url: Some("http://localhost:8000".into()),
            voice: false,
            beep: true,
            speech_command: Some("say -v Alex".into()),
            review_mode: ReviewMode::Weighted,
            word_filter: WordFilter::Week,
        };
        store.save(&cfg).unwrap();
        let loaded = store.load();
        assert_eq!(cfg, loaded);
        assert_eq!(loaded.cue_settings(), CueSettings { voice: false, chime: true });
        assert_eq!(loaded.speech_command(), "say -v Alex");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"review_mode": "recent"}"#).unwrap();
        let loaded = FileConfigStore::with_path(&path).load();
        assert_eq!(loaded.review_mode, ReviewMode::Recent);
        assert!(loaded.voice);
        assert_eq!(loaded.api_url, None);
    }

    #[test]
    fn garbage_file_is_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, b"not json").unwrap();
        assert_eq!(FileConfigStore::with_path(&path).load(), Config::default());
    }
}
