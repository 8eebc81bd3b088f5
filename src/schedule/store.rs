use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::Schedule;
use crate::app_dirs::AppDirs;
use crate::error::{Error, Result};

const DEFAULT_SAVED_NAME: &str = "Custom Back Routine";

/// A saved schedule as listed by a library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSchedule {
    pub id: String,
    pub name: String,
    pub schedule: Schedule,
}

/// Somewhere schedules can be saved and listed: the local file or the backend.
pub trait ScheduleLibrary {
    fn list_schedules(&self) -> Result<Vec<StoredSchedule>>;
    /// Insert, or replace the entry with the same id.
    fn save_schedule(&self, schedule: &Schedule) -> Result<StoredSchedule>;
    fn delete_schedule(&self, id: &str) -> Result<()>;
}

pub(crate) fn saved_name(schedule: &Schedule) -> String {
    let name = schedule.name.trim();
    if name.is_empty() {
        DEFAULT_SAVED_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// Custom schedules kept in a JSON array on disk.
#[derive(Debug, Clone)]
pub struct FileScheduleStore {
    path: PathBuf,
}

impl FileScheduleStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::schedules_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    /// A missing file is an empty library; one that exists but does not parse
    /// is an error so writers never overwrite it.
    fn load_all(&self) -> Result<Vec<Schedule>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice::<Vec<Schedule>>(&bytes).map_err(|e| {
            Error::InvalidInput(format!("schedule file {:?} is unreadable: {}", self.path, e))
        })
    }

    fn write_all(&self, all: &[Schedule]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(all)?)?;
        Ok(())
    }
}

impl ScheduleLibrary for FileScheduleStore {
    fn list_schedules(&self) -> Result<Vec<StoredSchedule>> {
        let all = self.load_all().unwrap_or_else(|e| {
            log::warn!("{}", e);
            Vec::new()
        });
        Ok(all
            .into_iter()
            .map(|schedule| StoredSchedule {
                id: schedule.id.clone(),
                name: saved_name(&schedule),
                schedule,
            })
            .collect())
    }

    fn save_schedule(&self, schedule: &Schedule) -> Result<StoredSchedule> {
        let mut saved = schedule.clone();
        if saved.id.is_empty() {
            saved.id = super::create_id("sch");
        }
        let mut all = self.load_all()?;
        match all.iter().position(|s| s.id == saved.id) {
            Some(idx) => all[idx] = saved.clone(),
            None => all.push(saved.clone()),
        }
        self.write_all(&all)?;
        log::info!("saved schedule {} to {:?}", saved.id, self.path);
        Ok(StoredSchedule {
            id: saved.id.clone(),
            name: saved_name(&saved),
            schedule: saved,
        })
    }

    fn delete_schedule(&self, id: &str) -> Result<()> {
        let all: Vec<Schedule> = self.load_all()?.into_iter().filter(|s| s.id != id).collect();
        self.write_all(&all)
    }
}
