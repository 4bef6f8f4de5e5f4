//! In-memory doubles for the domain traits, shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::{GrayImage, RgbImage};

use crate::detection::domain::face_detector::{DetectionParams, FaceDetector};
use crate::device::domain::camera_device::{CameraBackend, CameraDevice, DeviceDescriptor};
use crate::pipeline::display_sink::DisplaySink;
use crate::shared::frame::Frame;
use crate::shared::region::BoundingBox;
use crate::stats::domain::stats_record::{StatsError, StatsRecord, StatsRepository};
use crate::stats::domain::stats_store::StatsStore;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_writer::{EncoderSettings, VideoWriter, VideoWriterFactory};

/// Frame whose pixels differ along both axes, so mirroring is observable.
pub fn gradient_frame(width: u32, height: u32, index: usize) -> Frame {
    let image = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            ((x + y + index as u32) % 256) as u8,
        ])
    });
    Frame::new(image, index)
}

// --- Camera ---

/// Counts device handles across every device a [`MockBackend`] hands out.
#[derive(Default)]
pub struct DeviceLedger {
    open_now: Cell<usize>,
    max_open: Cell<usize>,
    open_calls: RefCell<Vec<u32>>,
    fail_reads: Cell<bool>,
}

impl DeviceLedger {
    pub fn open_now(&self) -> usize {
        self.open_now.get()
    }

    pub fn max_open(&self) -> usize {
        self.max_open.get()
    }

    pub fn open_calls(&self) -> Vec<u32> {
        self.open_calls.borrow().clone()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    fn acquire(&self) {
        let now = self.open_now.get() + 1;
        self.open_now.set(now);
        self.max_open.set(self.max_open.get().max(now));
    }

    fn release(&self) {
        self.open_now.set(self.open_now.get().saturating_sub(1));
    }
}

pub struct MockBackend {
    openable: RefCell<BTreeSet<u32>>,
    resolution: (u32, u32),
    frame_rate: Option<f64>,
    ledger: Rc<DeviceLedger>,
}

impl MockBackend {
    pub fn new(openable: &[u32]) -> Self {
        Self {
            openable: RefCell::new(openable.iter().copied().collect()),
            resolution: (64, 48),
            frame_rate: Some(30.0),
            ledger: Rc::new(DeviceLedger::default()),
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = (width, height);
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: Option<f64>) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn ledger(&self) -> Rc<DeviceLedger> {
        Rc::clone(&self.ledger)
    }

    /// Makes `index` fail (or succeed again) on subsequent opens.
    pub fn set_openable(&self, index: u32, openable: bool) {
        let mut set = self.openable.borrow_mut();
        if openable {
            set.insert(index);
        } else {
            set.remove(&index);
        }
    }
}

impl CameraBackend for MockBackend {
    fn open(&self, index: u32) -> Result<Box<dyn CameraDevice>, Box<dyn std::error::Error>> {
        self.ledger.open_calls.borrow_mut().push(index);
        if !self.openable.borrow().contains(&index) {
            return Err(format!("no device at index {index}").into());
        }
        self.ledger.acquire();
        Ok(Box::new(MockDevice {
            index,
            resolution: self.resolution,
            frame_rate: self.frame_rate,
            frames_read: 0,
            ledger: Rc::clone(&self.ledger),
        }))
    }
}

struct MockDevice {
    index: u32,
    resolution: (u32, u32),
    frame_rate: Option<f64>,
    frames_read: usize,
    ledger: Rc<DeviceLedger>,
}

impl CameraDevice for MockDevice {
    fn read_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
        if self.ledger.fail_reads.get() {
            return Err(format!("read from device {} failed", self.index).into());
        }
        let frame = gradient_frame(self.resolution.0, self.resolution.1, self.frames_read);
        self.frames_read += 1;
        Ok(frame)
    }

    fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    fn frame_rate(&self) -> Option<f64> {
        self.frame_rate
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.ledger.release();
    }
}

// --- Detection ---

/// Returns the same boxes every call and remembers the params it saw.
pub struct StubDetector {
    boxes: Vec<BoundingBox>,
    pub calls: Rc<RefCell<Vec<(u32, u32, DetectionParams)>>>,
}

impl StubDetector {
    pub fn new(boxes: Vec<BoundingBox>) -> Self {
        Self {
            boxes,
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl FaceDetector for StubDetector {
    fn detect(
        &mut self,
        image: &GrayImage,
        params: &DetectionParams,
    ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        self.calls
            .borrow_mut()
            .push((image.width(), image.height(), params.clone()));
        Ok(self.boxes.clone())
    }
}

pub struct FailingDetector;

impl FaceDetector for FailingDetector {
    fn detect(
        &mut self,
        _image: &GrayImage,
        _params: &DetectionParams,
    ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        Err("inference failed".into())
    }
}

// --- Encoding ---

/// Shared view of every [`MockVideoWriter`] produced by a factory.
#[derive(Default)]
pub struct EncoderLedger {
    open_now: Cell<usize>,
    pub opened: RefCell<Vec<(PathBuf, EncoderSettings)>>,
    pub frames: RefCell<Vec<Frame>>,
    closed: Cell<usize>,
    fail_open: Cell<bool>,
    fail_write: Cell<bool>,
}

impl EncoderLedger {
    pub fn open_now(&self) -> usize {
        self.open_now.get()
    }

    pub fn allocated(&self) -> usize {
        self.opened.borrow().len()
    }

    pub fn closed(&self) -> usize {
        self.closed.get()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.set(fail);
    }

    pub fn set_fail_write(&self, fail: bool) {
        self.fail_write.set(fail);
    }
}

pub struct MockVideoWriter {
    ledger: Rc<EncoderLedger>,
    is_open: bool,
}

impl VideoWriter for MockVideoWriter {
    fn open(
        &mut self,
        path: &Path,
        settings: &EncoderSettings,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.ledger.fail_open.get() {
            return Err("codec not available".into());
        }
        self.ledger
            .opened
            .borrow_mut()
            .push((path.to_path_buf(), settings.clone()));
        self.ledger.open_now.set(self.ledger.open_now.get() + 1);
        self.is_open = true;
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if self.ledger.fail_write.get() {
            return Err("write failed".into());
        }
        self.ledger.frames.borrow_mut().push(frame.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.is_open {
            self.is_open = false;
            self.ledger.open_now.set(self.ledger.open_now.get() - 1);
            self.ledger.closed.set(self.ledger.closed.get() + 1);
        }
        Ok(())
    }
}

impl Drop for MockVideoWriter {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

pub fn writer_factory(ledger: &Rc<EncoderLedger>) -> VideoWriterFactory {
    let ledger = Rc::clone(ledger);
    Box::new(move || {
        Box::new(MockVideoWriter {
            ledger: Rc::clone(&ledger),
            is_open: false,
        }) as Box<dyn VideoWriter>
    })
}

/// Captures every image write instead of touching the filesystem.
#[derive(Default)]
pub struct RecordingImageWriter {
    pub writes: Rc<RefCell<Vec<(PathBuf, Frame)>>>,
    pub fail: Cell<bool>,
}

impl ImageWriter for RecordingImageWriter {
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        _size: Option<(u32, u32)>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.fail.get() {
            return Err("disk full".into());
        }
        self.writes
            .borrow_mut()
            .push((path.to_path_buf(), frame.clone()));
        Ok(())
    }
}

// --- Display ---

#[derive(Default)]
pub struct DisplayLog {
    pub shown: Vec<Frame>,
    pub thumbnails: Vec<(u32, Frame)>,
    pub clears: usize,
}

#[derive(Default)]
pub struct RecordingDisplaySink {
    pub log: Rc<RefCell<DisplayLog>>,
}

impl DisplaySink for RecordingDisplaySink {
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.log.borrow_mut().shown.push(frame.clone());
        Ok(())
    }

    fn show_thumbnail(
        &mut self,
        descriptor: &DeviceDescriptor,
        frame: &Frame,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.log
            .borrow_mut()
            .thumbnails
            .push((descriptor.index(), frame.clone()));
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.log.borrow_mut().clears += 1;
        Ok(())
    }
}

// --- Stats ---

/// Stats repository backed by a shared cell instead of a file.
#[derive(Default)]
pub struct MemoryStatsRepository {
    pub stored: Rc<RefCell<Option<StatsRecord>>>,
    pub saves: Rc<Cell<usize>>,
    pub fail_saves: Rc<Cell<bool>>,
}

impl StatsRepository for MemoryStatsRepository {
    fn load(&self) -> Result<Option<StatsRecord>, StatsError> {
        Ok(self.stored.borrow().clone())
    }

    fn save(&self, record: &StatsRecord) -> Result<(), StatsError> {
        if self.fail_saves.get() {
            return Err(StatsError::Write {
                path: PathBuf::from("memory"),
                source: "read-only".into(),
            });
        }
        *self.stored.borrow_mut() = Some(record.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

/// Handles onto a [`MemoryStatsRepository`] after it has been boxed into a
/// [`StatsStore`].
pub struct StatsProbe {
    pub stored: Rc<RefCell<Option<StatsRecord>>>,
    pub saves: Rc<Cell<usize>>,
    pub fail_saves: Rc<Cell<bool>>,
}

impl StatsProbe {
    pub fn saved(&self) -> StatsRecord {
        self.stored.borrow().clone().unwrap_or_default()
    }
}

/// Stats store over an in-memory repository, saving into `save_dir`.
/// The save counter starts at zero.
pub fn memory_stats(save_dir: &Path) -> (StatsStore, StatsProbe) {
    let repository = MemoryStatsRepository::default();
    let probe = StatsProbe {
        stored: Rc::clone(&repository.stored),
        saves: Rc::clone(&repository.saves),
        fail_saves: Rc::clone(&repository.fail_saves),
    };
    let mut store = StatsStore::load(Box::new(repository));
    store.set_save_path(save_dir.to_path_buf());
    probe.saves.set(0);
    (store, probe)
}
