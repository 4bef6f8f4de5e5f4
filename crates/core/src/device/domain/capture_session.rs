use std::rc::Rc;
use std::time::Duration;

use crate::shared::constants::FALLBACK_FPS;
use crate::shared::frame::Frame;

use super::camera_device::{CameraBackend, CameraDevice, CaptureError, DeviceDescriptor};

/// An open device together with the descriptor it was opened from.
///
/// The session holds at most one of these; replacing it drops (releases)
/// the previous device.
struct DeviceHandle {
    descriptor: DeviceDescriptor,
    device: Box<dyn CameraDevice>,
}

/// Owns the primary capture device and the camera running flag.
pub struct CaptureSession {
    backend: Rc<dyn CameraBackend>,
    handle: Option<DeviceHandle>,
    running: bool,
}

impl CaptureSession {
    pub fn new(backend: Rc<dyn CameraBackend>) -> Self {
        Self {
            backend,
            handle: None,
            running: false,
        }
    }

    /// Opens `descriptor` as the active device.
    ///
    /// Any device already held is released first. On failure the session
    /// holds no device.
    pub fn open(&mut self, descriptor: &DeviceDescriptor) -> Result<(), CaptureError> {
        self.close();
        let device = self
            .backend
            .open(descriptor.index())
            .map_err(|source| CaptureError::DeviceUnavailable {
                descriptor: descriptor.clone(),
                source,
            })?;
        let (width, height) = device.resolution();
        log::info!("Opened {descriptor} ({width}x{height})");
        self.handle = Some(DeviceHandle {
            descriptor: descriptor.clone(),
            device,
        });
        Ok(())
    }

    /// Releases the current device, then opens `descriptor`.
    ///
    /// Never falls back to the previous device: on failure the error is
    /// returned and the session is left without an active device.
    pub fn switch_to(&mut self, descriptor: &DeviceDescriptor) -> Result<(), CaptureError> {
        if let Some(current) = self.active_descriptor() {
            log::info!("Switching from {current} to {descriptor}");
        }
        self.open(descriptor)
    }

    /// Blocking read from the active device.
    ///
    /// Returns `None` when no device is open or the read fails; both are
    /// treated as "no frame this tick".
    pub fn capture_frame(&mut self) -> Option<Frame> {
        let handle = self.handle.as_mut()?;
        match handle.device.read_frame() {
            Ok(frame) => Some(frame),
            Err(e) => {
                log::debug!("Frame read from {} failed: {e}", handle.descriptor);
                None
            }
        }
    }

    /// Releases the active device. Safe to call when nothing is open.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            log::info!("Released {}", handle.descriptor);
        }
    }

    /// Starts streaming. Requires an open device.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.handle.is_none() {
            return Err(CaptureError::NoActiveDevice);
        }
        self.running = true;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// True when streaming is on and a device is held.
    pub fn is_running(&self) -> bool {
        self.running && self.handle.is_some()
    }

    pub fn active_descriptor(&self) -> Option<&DeviceDescriptor> {
        self.handle.as_ref().map(|h| &h.descriptor)
    }

    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.handle.as_ref().map(|h| h.device.resolution())
    }

    /// Tick interval: the device's frame rate when it reports a positive
    /// one, otherwise [`FALLBACK_FPS`].
    pub fn frame_interval(&self) -> Duration {
        let fps = self
            .handle
            .as_ref()
            .and_then(|h| h.device.frame_rate())
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .unwrap_or(FALLBACK_FPS);
        Duration::from_secs_f64(1.0 / fps)
    }
}
