use std::fmt;

use thiserror::Error;

use crate::shared::frame::Frame;

/// A capture device discovered by probing. Immutable once discovered.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeviceDescriptor {
    index: u32,
    display_name: String,
}

impl DeviceDescriptor {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            display_name: format!("Webcam {index}"),
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

/// An open capture device handle.
///
/// Dropping the value releases the underlying OS resource, so ownership of
/// the box is ownership of the device.
pub trait CameraDevice {
    /// Blocking read of the next frame, converted to RGB.
    fn read_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error>>;

    /// Frame size delivered by `read_frame`.
    fn resolution(&self) -> (u32, u32);

    /// Frame rate reported by the device, if it reports one.
    fn frame_rate(&self) -> Option<f64>;
}

/// Opens capture devices by numeric index.
pub trait CameraBackend {
    fn open(&self, index: u32) -> Result<Box<dyn CameraDevice>, Box<dyn std::error::Error>>;
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("no capture devices found")]
    NoDevicesFound,
    #[error("{descriptor} is unavailable: {source}")]
    DeviceUnavailable {
        descriptor: DeviceDescriptor,
        #[source]
        source: Box<dyn std::error::Error>,
    },
    #[error("no capture device is active")]
    NoActiveDevice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_follows_index() {
        let d = DeviceDescriptor::new(3);
        assert_eq!(d.index(), 3);
        assert_eq!(d.display_name(), "Webcam 3");
        assert_eq!(d.to_string(), "Webcam 3");
    }

    #[test]
    fn test_device_unavailable_message_names_device() {
        let err = CaptureError::DeviceUnavailable {
            descriptor: DeviceDescriptor::new(2),
            source: "busy".into(),
        };
        assert_eq!(err.to_string(), "Webcam 2 is unavailable: busy");
    }
}
