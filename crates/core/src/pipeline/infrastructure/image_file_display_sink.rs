use std::path::{Path, PathBuf};

use crate::device::domain::camera_device::DeviceDescriptor;
use crate::pipeline::display_sink::DisplaySink;
use crate::shared::constants::THUMBNAIL_SIZE;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::infrastructure::image_file_writer::ImageFileWriter;

const LIVE_FILE: &str = "live.jpg";

/// Presents frames as JPEG files that any image viewer can watch:
/// `live.jpg` for the main feed and `thumb_webcam_<n>.jpg` per secondary
/// camera.
pub struct ImageFileDisplaySink {
    dir: PathBuf,
    writer: Box<dyn ImageWriter>,
}

impl ImageFileDisplaySink {
    pub fn new(dir: PathBuf) -> Self {
        Self::with_writer(dir, Box::new(ImageFileWriter::new()))
    }

    pub fn with_writer(dir: PathBuf, writer: Box<dyn ImageWriter>) -> Self {
        Self { dir, writer }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn live_path(&self) -> PathBuf {
        self.dir.join(LIVE_FILE)
    }

    pub fn thumbnail_path(&self, descriptor: &DeviceDescriptor) -> PathBuf {
        self.dir
            .join(format!("thumb_webcam_{}.jpg", descriptor.index()))
    }
}

impl DisplaySink for ImageFileDisplaySink {
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        self.writer.write(&self.live_path(), frame, None)
    }

    fn show_thumbnail(
        &mut self,
        descriptor: &DeviceDescriptor,
        frame: &Frame,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.writer
            .write(&self.thumbnail_path(descriptor), frame, Some(THUMBNAIL_SIZE))
    }

    fn clear(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        match std::fs::remove_file(self.live_path()) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
