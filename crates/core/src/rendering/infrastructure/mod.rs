pub mod bitmap_font;
pub mod frame_transform;
pub mod overlay_painter;
