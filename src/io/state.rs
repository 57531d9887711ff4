//! Last-update bookkeeping (`state/state.json`).

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateState {
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<UpdateState>, AppError> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let file = File::open(&self.path)
            .map_err(|e| AppError::io(format!("Failed to open state '{}': {e}", self.path.display())))?;
        let state = serde_json::from_reader(file)
            .map_err(|e| AppError::data_format(format!("Invalid state file '{}': {e}", self.path.display())))?;
        Ok(Some(state))
    }

    pub fn save(&self, last_update: DateTime<Utc>) -> Result<UpdateState, AppError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|e| AppError::io(format!("Failed to create '{}': {e}", dir.display())))?;
        }
        let state = UpdateState { last_update };
        let file = File::create(&self.path)
            .map_err(|e| AppError::io(format!("Failed to create state '{}': {e}", self.path.display())))?;
        serde_json::to_writer(file, &state)
            .map_err(|e| AppError::io(format!("Failed to write state: {e}")))?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateFile::new(dir.path().join("state").join("state.json"));
        assert!(state.load().unwrap().is_none());

        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        state.save(at).unwrap();
        assert_eq!(state.load().unwrap(), Some(UpdateState { last_update: at }));
    }
}
