use crate::device::domain::camera_device::DeviceDescriptor;
use crate::shared::frame::Frame;

/// Where annotated frames and secondary-feed thumbnails end up.
pub trait DisplaySink {
    /// Presents the annotated main feed.
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Presents a preview of a non-active device.
    fn show_thumbnail(
        &mut self,
        descriptor: &DeviceDescriptor,
        frame: &Frame,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Blanks the main feed, e.g. after the camera stops.
    fn clear(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}

/// Headless sink that discards everything.
pub struct NullDisplaySink;

impl DisplaySink for NullDisplaySink {
    fn show(&mut self, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn show_thumbnail(
        &mut self,
        _descriptor: &DeviceDescriptor,
        _frame: &Frame,
    ) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn clear(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
