use std::path::Path;

use crate::shared::frame::Frame;

/// Parameters fixed for the lifetime of one encoded file.
#[derive(Clone, Debug, PartialEq)]
pub struct EncoderSettings {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

/// Abstracts video encoding so recording can write output without
/// depending on a specific codec library.
pub trait VideoWriter {
    fn open(
        &mut self,
        path: &Path,
        settings: &EncoderSettings,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Appends one frame. Frames must match the opened dimensions.
    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes and finalizes the container. Calling it again is a no-op.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}

/// Produces a fresh, unopened writer for each recording.
pub type VideoWriterFactory = Box<dyn Fn() -> Box<dyn VideoWriter>>;
