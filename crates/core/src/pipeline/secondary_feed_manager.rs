use std::rc::Rc;

use crate::device::domain::camera_device::{CameraBackend, CameraDevice, DeviceDescriptor};
use crate::device::domain::device_enumerator::DeviceEnumerator;
use crate::rendering::infrastructure::frame_transform::mirror;
use crate::shared::frame::Frame;

use super::display_sink::DisplaySink;

struct SecondaryFeed {
    descriptor: DeviceDescriptor,
    device: Box<dyn CameraDevice>,
}

/// Keeps every non-active device open for low-rate thumbnail previews.
pub struct SecondaryFeedManager {
    backend: Rc<dyn CameraBackend>,
    enumerator: DeviceEnumerator,
    feeds: Vec<SecondaryFeed>,
}

impl SecondaryFeedManager {
    pub fn new(backend: Rc<dyn CameraBackend>, enumerator: DeviceEnumerator) -> Self {
        Self {
            backend,
            enumerator,
            feeds: Vec::new(),
        }
    }

    /// Releases every feed, rescans, then opens each device except `active`.
    ///
    /// The active device is held by the capture session, so the rescan
    /// skips it entirely. Devices that fail to open are skipped with a
    /// warning.
    pub fn rebuild(&mut self, active: Option<&DeviceDescriptor>) {
        self.release_all();

        for descriptor in self.enumerator.scan_excluding(active.map(|d| d.index())) {
            match self.backend.open(descriptor.index()) {
                Ok(device) => self.feeds.push(SecondaryFeed { descriptor, device }),
                Err(e) => log::warn!("Secondary feed {descriptor} unavailable: {e}"),
            }
        }
        log::debug!("{} secondary feed(s) open", self.feeds.len());
    }

    /// Reads one frame from each feed and hands it to `sink` as a mirrored
    /// thumbnail. Returns how many thumbnails were shown.
    pub fn poll(&mut self, sink: &mut dyn DisplaySink) -> usize {
        let mut shown = 0;
        for feed in &mut self.feeds {
            let frame = match feed.device.read_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    log::debug!("Secondary read from {} failed: {e}", feed.descriptor);
                    continue;
                }
            };
            let thumbnail = Frame::new(mirror(frame.image()), frame.index());
            match sink.show_thumbnail(&feed.descriptor, &thumbnail) {
                Ok(()) => shown += 1,
                Err(e) => log::warn!("Failed to show thumbnail for {}: {e}", feed.descriptor),
            }
        }
        shown
    }

    pub fn release_all(&mut self) {
        if !self.feeds.is_empty() {
            log::debug!("Releasing {} secondary feed(s)", self.feeds.len());
        }
        self.feeds.clear();
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &DeviceDescriptor> {
        self.feeds.iter().map(|f| &f.descriptor)
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}
