use image::GrayImage;

use crate::shared::region::BoundingBox;

/// Tuning passed to the detector on every call.
///
/// `scale_factor` and `min_neighbors` are cascade-style pyramid parameters;
/// backends that have no such pyramid accept and ignore them. `min_size`
/// is honoured by every backend.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionParams {
    pub scale_factor: f64,
    pub min_neighbors: u32,
    pub min_size: Option<(u32, u32)>,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.2,
            min_neighbors: 6,
            min_size: None,
        }
    }
}

impl DetectionParams {
    pub fn with_min_size(mut self, min_size: Option<(u32, u32)>) -> Self {
        self.min_size = min_size;
        self
    }

    /// Drops boxes smaller than `min_size`, if one is set.
    pub fn retain_large_enough(&self, boxes: &mut Vec<BoundingBox>) {
        if let Some(min) = self.min_size {
            boxes.retain(|b| b.meets_min_size(min));
        }
    }
}

/// Domain interface for face detection.
///
/// Input is a single-channel luminance image; output boxes are in that
/// image's pixel coordinates. Implementations may keep state between calls,
/// hence `&mut self`.
pub trait FaceDetector {
    fn detect(
        &mut self,
        image: &GrayImage,
        params: &DetectionParams,
    ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>>;
}
