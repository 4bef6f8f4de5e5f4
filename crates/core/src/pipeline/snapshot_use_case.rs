use std::path::PathBuf;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::device::domain::capture_session::CaptureSession;
use crate::rendering::infrastructure::frame_transform::{desaturate, mirror};
use crate::shared::constants::SNAPSHOT_EXTENSION;
use crate::shared::frame::Frame;
use crate::shared::timestamp::timestamped_path;
use crate::stats::domain::stats_store::StatsStore;
use crate::video::domain::image_writer::ImageWriter;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("could not capture a frame for the snapshot")]
    FrameUnavailable,
    #[error("could not save snapshot to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
}

/// Where and when a snapshot was saved.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotResult {
    pub path: PathBuf,
    pub timestamp: DateTime<Local>,
}

/// Saves a still image from a fresh device read.
///
/// Only the mirror (and optional desaturation) is applied: snapshots skip
/// zoom, detection and overlays, so they need not match the live view.
pub struct SnapshotUseCase {
    image_writer: Box<dyn ImageWriter>,
    desaturate: bool,
}

impl SnapshotUseCase {
    pub fn new(image_writer: Box<dyn ImageWriter>, desaturate: bool) -> Self {
        Self {
            image_writer,
            desaturate,
        }
    }

    pub fn execute(
        &self,
        capture: &mut CaptureSession,
        stats: &mut StatsStore,
        now: DateTime<Local>,
    ) -> Result<SnapshotResult, SnapshotError> {
        let raw = capture
            .capture_frame()
            .ok_or(SnapshotError::FrameUnavailable)?;

        let mut image = mirror(raw.image());
        if self.desaturate {
            image = desaturate(&image);
        }
        let still = Frame::new(image, raw.index());

        let path = timestamped_path(stats.save_path(), "snapshot", &now, SNAPSHOT_EXTENSION);
        self.image_writer
            .write(&path, &still, None)
            .map_err(|source| SnapshotError::WriteFailed {
                path: path.clone(),
                source,
            })?;

        stats.record_photo(&now);
        log::info!("Snapshot saved: {}", path.display());
        Ok(SnapshotResult {
            path,
            timestamp: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::domain::camera_device::DeviceDescriptor;
    use crate::testing::{gradient_frame, memory_stats, MockBackend, RecordingImageWriter};
    use chrono::TimeZone;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::TempDir;

    type Writes = Rc<RefCell<Vec<(PathBuf, Frame)>>>;

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 1, 14, 0, 0).unwrap()
    }

    fn open_capture(backend: MockBackend) -> CaptureSession {
        let mut capture = CaptureSession::new(Rc::new(backend));
        capture.open(&DeviceDescriptor::new(0)).unwrap();
        capture
    }

    fn use_case(desaturate: bool) -> (SnapshotUseCase, Writes) {
        let writer = RecordingImageWriter::default();
        let writes = writer.writes.clone();
        (SnapshotUseCase::new(Box::new(writer), desaturate), writes)
    }

    #[test]
    fn test_snapshot_writes_timestamped_png_and_counts() {
        let tmp = TempDir::new().unwrap();
        let (mut stats, probe) = memory_stats(tmp.path());
        let mut capture = open_capture(MockBackend::new(&[0]));
        let (snapshot, writes) = use_case(true);

        let result = snapshot.execute(&mut capture, &mut stats, t0()).unwrap();

        assert_eq!(result.path, tmp.path().join("snapshot_20240601_140000.png"));
        assert_eq!(result.timestamp, t0());
        assert_eq!(writes.borrow().len(), 1);
        assert_eq!(stats.record().photos, 1);
        assert_eq!(stats.record().last_photo, "01/06/2024 14:00:00");
        assert_eq!(probe.saved().photos, 1);
    }

    #[test]
    fn test_snapshot_is_mirrored_and_desaturated() {
        let tmp = TempDir::new().unwrap();
        let (mut stats, _) = memory_stats(tmp.path());
        let mut capture = open_capture(MockBackend::new(&[0]));
        let (snapshot, writes) = use_case(true);

        snapshot.execute(&mut capture, &mut stats, t0()).unwrap();

        let expected = desaturate(&mirror(gradient_frame(64, 48, 0).image()));
        assert_eq!(writes.borrow()[0].1.image(), &expected);
    }

    #[test]
    fn test_colour_snapshot_keeps_colour() {
        let tmp = TempDir::new().unwrap();
        let (mut stats, _) = memory_stats(tmp.path());
        let mut capture = open_capture(MockBackend::new(&[0]));
        let (snapshot, writes) = use_case(false);

        snapshot.execute(&mut capture, &mut stats, t0()).unwrap();

        let expected = mirror(gradient_frame(64, 48, 0).image());
        assert_eq!(writes.borrow()[0].1.image(), &expected);
    }

    #[test]
    fn test_snapshot_reads_fresh_frame_even_when_stopped() {
        let tmp = TempDir::new().unwrap();
        let (mut stats, _) = memory_stats(tmp.path());
        let mut capture = open_capture(MockBackend::new(&[0]));
        capture.capture_frame();
        let (snapshot, writes) = use_case(false);

        snapshot.execute(&mut capture, &mut stats, t0()).unwrap();

        assert_eq!(writes.borrow()[0].1.index(), 1);
    }

    #[test]
    fn test_read_failure_leaves_stats_alone() {
        let tmp = TempDir::new().unwrap();
        let (mut stats, probe) = memory_stats(tmp.path());
        let backend = MockBackend::new(&[0]);
        backend.ledger().set_fail_reads(true);
        let mut capture = open_capture(backend);
        let (snapshot, writes) = use_case(true);

        let result = snapshot.execute(&mut capture, &mut stats, t0());

        assert!(matches!(result, Err(SnapshotError::FrameUnavailable)));
        assert!(writes.borrow().is_empty());
        assert_eq!(stats.record().photos, 0);
        assert_eq!(probe.saves.get(), 0);
    }

    #[test]
    fn test_without_device_frame_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let (mut stats, _) = memory_stats(tmp.path());
        let mut capture = CaptureSession::new(Rc::new(MockBackend::new(&[0])));
        let (snapshot, _) = use_case(true);

        assert!(matches!(
            snapshot.execute(&mut capture, &mut stats, t0()),
            Err(SnapshotError::FrameUnavailable)
        ));
    }

    #[test]
    fn test_write_failure_leaves_stats_alone() {
        let tmp = TempDir::new().unwrap();
        let (mut stats, _) = memory_stats(tmp.path());
        let mut capture = open_capture(MockBackend::new(&[0]));
        let writer = RecordingImageWriter::default();
        writer.fail.set(true);
        let snapshot = SnapshotUseCase::new(Box::new(writer), true);

        let result = snapshot.execute(&mut capture, &mut stats, t0());

        assert!(matches!(result, Err(SnapshotError::WriteFailed { .. })));
        assert_eq!(stats.record().photos, 0);
        assert_eq!(stats.record().last_photo, "never");
    }
}
