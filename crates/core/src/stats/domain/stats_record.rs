use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::timestamp::display_timestamp;

/// Placeholder timestamp for actions that have not happened yet.
pub const NEVER: &str = "never";

/// Usage counters persisted between runs.
///
/// Keys missing from a stored record take their default value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsRecord {
    pub photos: u64,
    pub videos: u64,
    pub last_photo: String,
    pub last_video: String,
    pub save_path: PathBuf,
}

impl Default for StatsRecord {
    fn default() -> Self {
        Self {
            photos: 0,
            videos: 0,
            last_photo: NEVER.to_string(),
            last_video: NEVER.to_string(),
            save_path: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl StatsRecord {
    pub fn record_photo(&mut self, at: &DateTime<Local>) {
        self.photos += 1;
        self.last_photo = display_timestamp(at);
    }

    /// Counts a recording as soon as it starts.
    pub fn record_video_started(&mut self) {
        self.videos += 1;
    }

    pub fn record_video_finished(&mut self, at: &DateTime<Local>) {
        self.last_video = display_timestamp(at);
    }
}

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("failed to read stats from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
    #[error("failed to parse stats in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write stats to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
}

/// Storage for a [`StatsRecord`].
pub trait StatsRepository {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<StatsRecord>, StatsError>;

    fn save(&self, record: &StatsRecord) -> Result<(), StatsError>;
}
