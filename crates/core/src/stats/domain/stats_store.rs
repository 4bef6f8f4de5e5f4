use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use super::stats_record::{StatsRecord, StatsRepository};

/// In-memory stats plus write-through persistence.
///
/// The in-memory record is authoritative: failed loads fall back to
/// defaults and failed saves are logged and otherwise ignored.
pub struct StatsStore {
    record: StatsRecord,
    repository: Box<dyn StatsRepository>,
}

impl StatsStore {
    pub fn load(repository: Box<dyn StatsRepository>) -> Self {
        let record = match repository.load() {
            Ok(Some(record)) => record,
            Ok(None) => {
                log::info!("No saved stats, starting fresh");
                StatsRecord::default()
            }
            Err(e) => {
                log::warn!("{e}; starting with default stats");
                StatsRecord::default()
            }
        };
        Self { record, repository }
    }

    pub fn record(&self) -> &StatsRecord {
        &self.record
    }

    pub fn save_path(&self) -> &Path {
        &self.record.save_path
    }

    pub fn record_photo(&mut self, at: &DateTime<Local>) {
        self.record.record_photo(at);
        self.persist();
    }

    pub fn record_video_started(&mut self) {
        self.record.record_video_started();
        self.persist();
    }

    pub fn record_video_finished(&mut self, at: &DateTime<Local>) {
        self.record.record_video_finished(at);
        self.persist();
    }

    pub fn set_save_path(&mut self, path: PathBuf) {
        self.record.save_path = path;
        self.persist();
    }

    /// Writes the current record. Returns whether the write succeeded.
    pub fn persist(&self) -> bool {
        match self.repository.save(&self.record) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("{e}; keeping stats in memory");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::domain::stats_record::{StatsError, NEVER};
    use crate::testing::MemoryStatsRepository;
    use chrono::TimeZone;
    use std::path::PathBuf;

    struct BrokenRepository;

    impl StatsRepository for BrokenRepository {
        fn load(&self) -> Result<Option<StatsRecord>, StatsError> {
            Err(StatsError::Read {
                path: PathBuf::from("stats.json"),
                source: "permission denied".into(),
            })
        }

        fn save(&self, _record: &StatsRecord) -> Result<(), StatsError> {
            Err(StatsError::Write {
                path: PathBuf::from("stats.json"),
                source: "permission denied".into(),
            })
        }
    }

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 18, 30, 0).unwrap()
    }

    #[test]
    fn test_load_failure_yields_defaults() {
        let store = StatsStore::load(Box::new(BrokenRepository));
        assert_eq!(store.record().photos, 0);
        assert_eq!(store.record().last_photo, NEVER);
    }

    #[test]
    fn test_load_uses_stored_record() {
        let repository = MemoryStatsRepository::default();
        let stored = StatsRecord {
            photos: 9,
            ..StatsRecord::default()
        };
        *repository.stored.borrow_mut() = Some(stored.clone());
        let store = StatsStore::load(Box::new(repository));
        assert_eq!(store.record(), &stored);
    }

    #[test]
    fn test_every_mutation_persists() {
        let repository = MemoryStatsRepository::default();
        let saves = repository.saves.clone();
        let stored = repository.stored.clone();
        let mut store = StatsStore::load(Box::new(repository));

        store.record_photo(&at());
        store.record_video_started();
        store.record_video_finished(&at());
        store.set_save_path(PathBuf::from("/media/out"));

        assert_eq!(saves.get(), 4);
        let saved = stored.borrow().clone().unwrap();
        assert_eq!(saved.photos, 1);
        assert_eq!(saved.videos, 1);
        assert_eq!(saved.last_video, "01/05/2024 18:30:00");
        assert_eq!(saved.save_path, PathBuf::from("/media/out"));
    }

    #[test]
    fn test_save_failure_keeps_memory_state() {
        let mut store = StatsStore::load(Box::new(BrokenRepository));
        store.record_photo(&at());
        store.record_photo(&at());
        assert_eq!(store.record().photos, 2);
        assert!(!store.persist());
    }
}
