use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeDelta};
use thiserror::Error;

use crate::device::domain::capture_session::CaptureSession;
use crate::shared::constants::{RECORDING_EXTENSION, RECORDING_FPS};
use crate::shared::frame::Frame;
use crate::shared::timestamp::{format_elapsed, timestamped_path};
use crate::stats::domain::stats_store::StatsStore;
use crate::video::domain::video_writer::{EncoderSettings, VideoWriter, VideoWriterFactory};

#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("recording needs a running camera")]
    RecordingRejected,
    #[error("cannot open encoder for {path}: {source}")]
    EncoderUnavailable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
}

/// A recording in progress. Owning this value means owning an open encoder.
pub struct ActiveRecording {
    started_at: DateTime<Local>,
    encoder: Box<dyn VideoWriter>,
    output_path: PathBuf,
}

pub enum RecordingState {
    Idle,
    Active(ActiveRecording),
}

/// Drives one encoder at a time from the annotated frame stream.
pub struct RecordingController {
    state: RecordingState,
    writer_factory: VideoWriterFactory,
}

impl RecordingController {
    pub fn new(writer_factory: VideoWriterFactory) -> Self {
        Self {
            state: RecordingState::Idle,
            writer_factory,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, RecordingState::Active(_))
    }

    pub fn output_path(&self) -> Option<&Path> {
        match &self.state {
            RecordingState::Active(active) => Some(&active.output_path),
            RecordingState::Idle => None,
        }
    }

    /// Opens an encoder sized to the active device and begins recording.
    ///
    /// Rejected without touching the encoder factory unless the camera is
    /// running. The video counter is bumped as soon as the encoder opens.
    /// Starting while already active returns the current output path.
    pub fn start(
        &mut self,
        capture: &CaptureSession,
        stats: &mut StatsStore,
        now: DateTime<Local>,
    ) -> Result<&Path, RecordingError> {
        if self.is_active() {
            log::debug!("Recording already active");
        } else {
            let (width, height) = match capture.resolution() {
                Some(resolution) if capture.is_running() => resolution,
                _ => return Err(RecordingError::RecordingRejected),
            };

            let output_path =
                timestamped_path(stats.save_path(), "record", &now, RECORDING_EXTENSION);
            let settings = EncoderSettings {
                width,
                height,
                fps: RECORDING_FPS,
            };
            let encoder = self.open_encoder(&output_path, &settings)?;

            log::info!(
                "Recording started: {} ({width}x{height})",
                output_path.display()
            );
            self.state = RecordingState::Active(ActiveRecording {
                started_at: now,
                encoder,
                output_path,
            });
            stats.record_video_started();
        }

        self.output_path()
            .ok_or(RecordingError::RecordingRejected)
    }

    fn open_encoder(
        &self,
        path: &Path,
        settings: &EncoderSettings,
    ) -> Result<Box<dyn VideoWriter>, RecordingError> {
        let unavailable = |source| RecordingError::EncoderUnavailable {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| unavailable(Box::new(e)))?;
        }
        let mut encoder = (self.writer_factory)();
        encoder.open(path, settings).map_err(unavailable)?;
        Ok(encoder)
    }

    /// Appends an annotated frame. Write failures are logged and the
    /// recording carries on. No-op while idle.
    pub fn record(&mut self, frame: &Frame) {
        if let RecordingState::Active(active) = &mut self.state {
            if let Err(e) = active.encoder.write(frame) {
                log::warn!(
                    "Failed to write frame {} to {}: {e}",
                    frame.index(),
                    active.output_path.display()
                );
            }
        }
    }

    /// Finalizes the encoder and returns the file it wrote. No-op while
    /// idle.
    pub fn stop(&mut self, stats: &mut StatsStore, now: DateTime<Local>) -> Option<PathBuf> {
        let RecordingState::Active(mut active) =
            std::mem::replace(&mut self.state, RecordingState::Idle)
        else {
            return None;
        };

        if let Err(e) = active.encoder.close() {
            log::warn!(
                "Failed to finalize {}: {e}",
                active.output_path.display()
            );
        }
        stats.record_video_finished(&now);
        log::info!(
            "Recording stopped: {} ({})",
            active.output_path.display(),
            format_elapsed(now - active.started_at)
        );
        Some(active.output_path)
    }

    pub fn elapsed(&self, now: DateTime<Local>) -> Option<TimeDelta> {
        match &self.state {
            RecordingState::Active(active) => Some(now - active.started_at),
            RecordingState::Idle => None,
        }
    }

    /// Elapsed time as `HH:MM:SS`, while recording.
    pub fn elapsed_label(&self, now: DateTime<Local>) -> Option<String> {
        self.elapsed(now).map(format_elapsed)
    }
}
