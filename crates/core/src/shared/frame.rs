use image::RgbImage;

/// A single captured frame: RGB pixels plus the capture sequence number.
///
/// Pixel data is always 3-channel RGB in row-major order. Format conversion
/// happens at device and encoder boundaries only.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    image: RgbImage,
    index: usize,
}

impl Frame {
    pub fn new(image: RgbImage, index: usize) -> Self {
        Self { image, index }
    }

    /// Wraps tightly packed RGB bytes. Returns `None` when the buffer length
    /// does not equal `width * height * 3`.
    pub fn from_raw(data: Vec<u8>, width: u32, height: u32, index: usize) -> Option<Self> {
        RgbImage::from_raw(width, height, data).map(|image| Self { image, index })
    }

    pub fn data(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.image.get_pixel(x, y).0
    }
}
