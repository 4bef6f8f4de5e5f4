use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::stats::domain::stats_record::{StatsError, StatsRecord, StatsRepository};

/// Stores the stats record as pretty-printed JSON at a fixed path.
pub struct JsonStatsRepository {
    path: PathBuf,
}

impl JsonStatsRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatsRepository for JsonStatsRepository {
    fn load(&self) -> Result<Option<StatsRecord>, StatsError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StatsError::Read {
                    path: self.path.clone(),
                    source: Box::new(e),
                })
            }
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StatsError::Parse {
                path: self.path.clone(),
                source,
            })
    }

    fn save(&self, record: &StatsRecord) -> Result<(), StatsError> {
        let write_err = |source: Box<dyn std::error::Error>| StatsError::Write {
            path: self.path.clone(),
            source,
        };
        let json = serde_json::to_string_pretty(record).map_err(|e| write_err(Box::new(e)))?;
        fs::write(&self.path, json).map_err(|e| write_err(Box::new(e)))
    }
}
