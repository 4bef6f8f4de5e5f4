use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::detection::domain::face_detector::{DetectionParams, FaceDetector};
use crate::device::domain::camera_device::{CameraBackend, CaptureError, DeviceDescriptor};
use crate::device::domain::capture_session::CaptureSession;
use crate::device::domain::device_enumerator::DeviceEnumerator;
use crate::recording::domain::recording_controller::{RecordingController, RecordingError};
use crate::rendering::domain::render_state::RenderState;
use crate::stats::domain::stats_store::StatsStore;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_writer::VideoWriterFactory;

use super::display_sink::DisplaySink;
use super::frame_pipeline::FramePipeline;
use super::secondary_feed_manager::SecondaryFeedManager;
use super::snapshot_use_case::{SnapshotError, SnapshotUseCase};
use super::tick_logger::TickLogger;
use super::user_command::{UserCommand, COMMAND_HELP};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Recording(#[from] RecordingError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("no camera at position {position}, {available} available")]
    UnknownCamera { position: usize, available: usize },
}

/// Result of a successfully applied command.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandOutcome {
    /// Feedback for the user.
    Message(String),
    Quit,
}

/// Everything a [`LiveSession`] is assembled from.
pub struct SessionParts {
    pub backend: Rc<dyn CameraBackend>,
    pub detector: Box<dyn FaceDetector>,
    pub detection_params: DetectionParams,
    pub writer_factory: VideoWriterFactory,
    pub image_writer: Box<dyn ImageWriter>,
    pub sink: Box<dyn DisplaySink>,
    pub logger: Box<dyn TickLogger>,
    pub stats: StatsStore,
    pub render_state: RenderState,
    pub location: String,
    pub desaturate_snapshots: bool,
}

/// The running application: devices, pipeline, recording and stats.
///
/// All state is owned here and touched only through `tick`,
/// `poll_secondary` and `apply`, which the scheduler calls one at a time.
pub struct LiveSession {
    devices: Vec<DeviceDescriptor>,
    capture: CaptureSession,
    pipeline: FramePipeline,
    recorder: RecordingController,
    snapshot: SnapshotUseCase,
    secondary: SecondaryFeedManager,
    stats: StatsStore,
    render_state: RenderState,
    sink: Box<dyn DisplaySink>,
    logger: Box<dyn TickLogger>,
}

impl LiveSession {
    /// Scans for cameras, opens the first one and the secondary feeds.
    ///
    /// Fails with [`CaptureError::NoDevicesFound`] when nothing opens. The
    /// camera starts stopped.
    pub fn open(parts: SessionParts, now: DateTime<Local>) -> Result<Self, SessionError> {
        let devices = DeviceEnumerator::new(Rc::clone(&parts.backend)).scan_required()?;
        log::info!(
            "Found {} camera(s): {}",
            devices.len(),
            devices
                .iter()
                .map(|d| d.display_name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut capture = CaptureSession::new(Rc::clone(&parts.backend));
        capture.open(&devices[0])?;

        let enumerator = DeviceEnumerator::new(Rc::clone(&parts.backend));
        let mut secondary = SecondaryFeedManager::new(parts.backend, enumerator);
        secondary.rebuild(capture.active_descriptor());

        Ok(Self {
            devices,
            capture,
            pipeline: FramePipeline::new(
                parts.detector,
                parts.detection_params,
                parts.location,
                now,
            ),
            recorder: RecordingController::new(parts.writer_factory),
            snapshot: SnapshotUseCase::new(parts.image_writer, parts.desaturate_snapshots),
            secondary,
            stats: parts.stats,
            render_state: parts.render_state,
            sink: parts.sink,
            logger: parts.logger,
        })
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    pub fn active_device(&self) -> Option<&DeviceDescriptor> {
        self.capture.active_descriptor()
    }

    pub fn secondary_devices(&self) -> impl Iterator<Item = &DeviceDescriptor> {
        self.secondary.descriptors()
    }

    pub fn is_running(&self) -> bool {
        self.capture.is_running()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_active()
    }

    pub fn render_state(&self) -> &RenderState {
        &self.render_state
    }

    pub fn stats(&self) -> &StatsStore {
        &self.stats
    }

    pub fn location(&self) -> &str {
        self.pipeline.location()
    }

    /// Interval the main tick should run at for the active device.
    pub fn frame_interval(&self) -> Duration {
        self.capture.frame_interval()
    }

    /// One capture → process → encode → display cycle.
    ///
    /// Returns `false` when the camera is stopped or no frame could be
    /// read; such a tick has no visible effect.
    pub fn tick(&mut self, now: DateTime<Local>) -> bool {
        if !self.capture.is_running() {
            return false;
        }

        let started = Instant::now();
        let Some(raw) = self.capture.capture_frame() else {
            self.logger.tick_skipped();
            return false;
        };
        self.logger.timing("capture", elapsed_ms(started));

        let started = Instant::now();
        let elapsed = self.recorder.elapsed_label(now);
        let annotated = self
            .pipeline
            .process(&raw, &self.render_state, now, elapsed.as_deref());
        self.logger.timing("process", elapsed_ms(started));

        if self.recorder.is_active() {
            let started = Instant::now();
            self.recorder.record(&annotated);
            self.logger.timing("encode", elapsed_ms(started));
        }

        let started = Instant::now();
        if let Err(e) = self.sink.show(&annotated) {
            log::warn!("Failed to display frame {}: {e}", annotated.index());
        }
        self.logger.timing("display", elapsed_ms(started));

        self.logger.tick_completed();
        true
    }

    /// Refreshes the thumbnails of the non-active cameras.
    pub fn poll_secondary(&mut self) -> usize {
        self.secondary.poll(self.sink.as_mut())
    }

    pub fn apply(
        &mut self,
        command: UserCommand,
        now: DateTime<Local>,
    ) -> Result<CommandOutcome, SessionError> {
        let message = match command {
            UserCommand::StartCamera => self.start_camera(now)?,
            UserCommand::StopCamera => self.stop_camera(now),
            UserCommand::ToggleCamera if self.capture.is_running() => self.stop_camera(now),
            UserCommand::ToggleCamera => self.start_camera(now)?,
            UserCommand::SwitchCamera(position) => self.switch_camera(position, now)?,
            UserCommand::ToggleRecording => self.toggle_recording(now)?,
            UserCommand::Snapshot => {
                let result = self
                    .snapshot
                    .execute(&mut self.capture, &mut self.stats, now)?;
                format!("Snapshot saved: {}", result.path.display())
            }
            UserCommand::SetColor(color) => {
                self.render_state.set_rect_color(color);
                format!("Box color: {},{},{}", color[0], color[1], color[2])
            }
            UserCommand::SetThickness(thickness) => {
                self.render_state.set_rect_thickness(thickness);
                format!("Box thickness: {}", self.render_state.rect_thickness())
            }
            UserCommand::SetZoom(zoom) => {
                self.render_state.set_zoom_factor(zoom);
                format!("Zoom: {:.2}", self.render_state.zoom_factor())
            }
            UserCommand::ToggleCoordinates => {
                let show = !self.render_state.show_coordinates();
                self.render_state.set_show_coordinates(show);
                format!("Coordinates: {}", on_off(show))
            }
            UserCommand::ToggleFps => {
                let show = !self.render_state.show_fps();
                self.render_state.set_show_fps(show);
                format!("FPS counter: {}", on_off(show))
            }
            UserCommand::ToggleGrayscale => {
                let gray = !self.render_state.grayscale();
                self.render_state.set_grayscale(gray);
                format!("Grayscale filter: {}", on_off(gray))
            }
            UserCommand::SetSavePath(dir) => {
                let message = format!("Saving to {}", dir.display());
                self.stats.set_save_path(dir);
                message
            }
            UserCommand::ShowStats => self.stats_summary(),
            UserCommand::ListCameras => self.camera_list(),
            UserCommand::Help => COMMAND_HELP.to_string(),
            UserCommand::Quit => return Ok(CommandOutcome::Quit),
        };
        Ok(CommandOutcome::Message(message))
    }

    /// Finalizes any recording and releases every device.
    pub fn shutdown(&mut self, now: DateTime<Local>) {
        if let Some(path) = self.recorder.stop(&mut self.stats, now) {
            log::info!("Recording saved on exit: {}", path.display());
        }
        self.capture.stop();
        self.capture.close();
        self.secondary.release_all();
        self.logger.summary();
    }

    fn start_camera(&mut self, now: DateTime<Local>) -> Result<String, SessionError> {
        if self.capture.is_running() {
            return Ok("Camera already running".to_string());
        }
        self.capture.start()?;
        self.pipeline.reset_clock(now);
        Ok(format!("Camera started: {}", self.active_label()))
    }

    fn stop_camera(&mut self, now: DateTime<Local>) -> String {
        let mut message = String::new();
        if let Some(path) = self.recorder.stop(&mut self.stats, now) {
            message = format!("Recording saved: {}\n", path.display());
        }
        self.capture.stop();
        self.clear_display();
        message.push_str("Camera stopped");
        message
    }

    fn switch_camera(
        &mut self,
        position: usize,
        now: DateTime<Local>,
    ) -> Result<String, SessionError> {
        let descriptor =
            self.devices
                .get(position)
                .cloned()
                .ok_or(SessionError::UnknownCamera {
                    position,
                    available: self.devices.len(),
                })?;

        let mut message = String::new();
        if let Some(path) = self.recorder.stop(&mut self.stats, now) {
            message = format!("Recording saved: {}\n", path.display());
        }

        // The target may be one of the secondary feeds; free them all first.
        self.secondary.release_all();
        let switched = self.capture.switch_to(&descriptor);
        self.secondary.rebuild(self.capture.active_descriptor());

        if let Err(e) = switched {
            self.clear_display();
            return Err(e.into());
        }
        self.pipeline.reset_clock(now);
        message.push_str(&format!("Active camera: {descriptor}"));
        Ok(message)
    }

    fn toggle_recording(&mut self, now: DateTime<Local>) -> Result<String, SessionError> {
        if let Some(path) = self.recorder.stop(&mut self.stats, now) {
            return Ok(format!("Recording saved: {}", path.display()));
        }
        let path = self.recorder.start(&self.capture, &mut self.stats, now)?;
        Ok(format!("Recording to {}", path.display()))
    }

    fn clear_display(&mut self) {
        if let Err(e) = self.sink.clear() {
            log::warn!("Failed to clear display: {e}");
        }
    }

    fn active_label(&self) -> String {
        self.capture
            .active_descriptor()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "none".to_string())
    }

    fn stats_summary(&self) -> String {
        let record = self.stats.record();
        format!(
            "Photos taken: {}\nLast photo: {}\nVideos recorded: {}\nLast video: {}\nSave path: {}",
            record.photos,
            record.last_photo,
            record.videos,
            record.last_video,
            record.save_path.display()
        )
    }

    fn camera_list(&self) -> String {
        let active = self.capture.active_descriptor();
        self.devices
            .iter()
            .enumerate()
            .map(|(position, d)| {
                let marker = if Some(d) == active { " (active)" } else { "" };
                format!("  {position}: {d}{marker}")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn elapsed_ms(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
