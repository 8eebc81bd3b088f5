use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "engtrack";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/engtrack`, or the platform data dir when `HOME` is unset.
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME)
                .map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("engtrack.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("engtrack.log"))
    }

    /// Local schedule library; falls back to the working directory.
    pub fn schedules_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("schedules.json"))
            .unwrap_or_else(|| PathBuf::from("engtrack_schedules.json"))
    }

    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|proj_dirs| proj_dirs.config_dir().to_path_buf())
    }
}
