/// Axis-aligned face bounding box in image coordinates.
///
/// `(x, y)` is the top-left corner. Boxes may extend past the frame edge;
/// drawing code clips them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from floating-point corners, rounding to the nearest pixel.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        let left = x1.min(x2).round() as i32;
        let top = y1.min(y2).round() as i32;
        let right = x1.max(x2).round() as i32;
        let bottom = y1.max(y2).round() as i32;
        Self::new(left, top, right - left, bottom - top)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// True when the box is at least `min_size` (width, height) in both axes.
    pub fn meets_min_size(&self, min_size: (u32, u32)) -> bool {
        self.width >= min_size.0 as i32 && self.height >= min_size.1 as i32
    }

    /// Intersects the box with a `width` x `height` frame.
    ///
    /// Returns `None` when nothing of the box is visible.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<BoundingBox> {
        let left = self.x.max(0);
        let top = self.y.max(0);
        let right = self.right().min(width as i32);
        let bottom = self.bottom().min(height as i32);
        let clamped = BoundingBox::new(left, top, right - left, bottom - top);
        if clamped.is_empty() {
            None
        } else {
            Some(clamped)
        }
    }
}
