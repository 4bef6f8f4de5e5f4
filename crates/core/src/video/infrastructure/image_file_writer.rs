use std::path::Path;

use image::imageops::FilterType;

use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Writes frames as PNG or JPEG through the `image` crate.
///
/// Missing parent directories are created. An optional target size
/// resizes with linear filtering, used for thumbnails.
#[derive(Default)]
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<(u32, u32)>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        match size {
            Some((w, h)) if (w, h) != frame.dimensions() => {
                image::imageops::resize(frame.image(), w, h, FilterType::Triangle).save(path)?
            }
            _ => frame.image().save(path)?,
        }
        Ok(())
    }
}
