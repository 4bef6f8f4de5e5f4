//! Primitive drawing on RGB frames: rectangle outlines, filled circles and
//! bitmap text. Everything clips silently at the image border.

use image::{Rgb, RgbImage};

use crate::shared::region::BoundingBox;

use super::bitmap_font::{glyph, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};

fn put(image: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        image.put_pixel(x as u32, y as u32, color);
    }
}

fn fill_rect(image: &mut RgbImage, left: i32, top: i32, right: i32, bottom: i32, color: Rgb<u8>) {
    let left = left.max(0);
    let top = top.max(0);
    let right = right.min(image.width() as i32 - 1);
    let bottom = bottom.min(image.height() as i32 - 1);
    for y in top..=bottom {
        for x in left..=right {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Outlines `rect` with a `thickness`-pixel border centred on its edge.
pub fn draw_rect(image: &mut RgbImage, rect: &BoundingBox, color: [u8; 3], thickness: u32) {
    if rect.is_empty() || thickness == 0 {
        return;
    }
    let color = Rgb(color);
    let t = thickness as i32;
    let inner = (t - 1) / 2;
    let outer = t / 2;

    let (left, top) = (rect.x, rect.y);
    let (right, bottom) = (rect.right() - 1, rect.bottom() - 1);

    // Four bands: top, bottom, left, right.
    fill_rect(image, left - outer, top - outer, right + outer, top + inner, color);
    fill_rect(image, left - outer, bottom - inner, right + outer, bottom + outer, color);
    fill_rect(image, left - outer, top - outer, left + inner, bottom + outer, color);
    fill_rect(image, right - inner, top - outer, right + outer, bottom + outer, color);
}

/// Solid disc of `radius` pixels around `(cx, cy)`.
pub fn fill_circle(image: &mut RgbImage, cx: i32, cy: i32, radius: u32, color: [u8; 3]) {
    let color = Rgb(color);
    let r = radius as i32;
    let r2 = r * r;
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r2 {
                put(image, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Pixel size of `text` at `scale`: `(width, height)`.
///
/// The trailing inter-character gap is not counted.
pub fn measure_text(text: &str, scale: u32) -> (u32, u32) {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return (0, 0);
    }
    let width = (chars * GLYPH_ADVANCE - (GLYPH_ADVANCE - GLYPH_WIDTH)) * scale;
    (width, GLYPH_HEIGHT * scale)
}

/// Draws `text` with its bottom-left corner at `(x, baseline)`.
///
/// Each font pixel becomes a `scale` x `scale` block.
pub fn draw_text(image: &mut RgbImage, text: &str, x: i32, baseline: i32, scale: u32, color: [u8; 3]) {
    let color = Rgb(color);
    let s = scale.max(1) as i32;
    let top = baseline - GLYPH_HEIGHT as i32 * s;
    let mut pen_x = x;

    for ch in text.chars() {
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..GLYPH_WIDTH as i32 {
                if (bits >> (GLYPH_WIDTH as i32 - 1 - col)) & 1 == 1 {
                    let px = pen_x + col * s;
                    let py = top + row as i32 * s;
                    fill_rect(image, px, py, px + s - 1, py + s - 1, color);
                }
            }
        }
        pen_x += GLYPH_ADVANCE as i32 * s;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const RED: [u8; 3] = [255, 0, 0];

    fn blank(w: u32, h: u32) -> RgbImage {
        RgbImage::new(w, h)
    }

    fn lit(image: &RgbImage, x: u32, y: u32) -> bool {
        image.get_pixel(x, y).0 != [0, 0, 0]
    }

    #[test]
    fn test_rect_thickness_one_is_single_outline() {
        let mut img = blank(20, 20);
        draw_rect(&mut img, &BoundingBox::new(5, 5, 10, 10), RED, 1);
        assert!(lit(&img, 5, 5));
        assert!(lit(&img, 14, 14));
        assert!(lit(&img, 10, 5));
        assert!(!lit(&img, 10, 10));
        assert!(!lit(&img, 4, 5));
        assert!(!lit(&img, 6, 6));
    }

    #[test]
    fn test_rect_thickness_grows_both_ways() {
        let mut img = blank(30, 30);
        draw_rect(&mut img, &BoundingBox::new(10, 10, 10, 10), RED, 3);
        assert!(lit(&img, 9, 15));
        assert!(lit(&img, 10, 15));
        assert!(lit(&img, 11, 15));
        assert!(!lit(&img, 8, 15));
        assert!(!lit(&img, 12, 15));
    }

    #[test]
    fn test_rect_clips_at_border() {
        let mut img = blank(10, 10);
        draw_rect(&mut img, &BoundingBox::new(-5, -5, 30, 30), RED, 4);
        assert!(!lit(&img, 5, 5));
    }

    #[test]
    fn test_fill_circle() {
        let mut img = blank(40, 40);
        fill_circle(&mut img, 20, 20, 10, RED);
        assert!(lit(&img, 20, 20));
        assert!(lit(&img, 30, 20));
        assert!(lit(&img, 20, 10));
        assert!(!lit(&img, 28, 28));
        assert!(!lit(&img, 31, 20));
    }

    #[test]
    fn test_fill_circle_partially_offscreen() {
        let mut img = blank(10, 10);
        fill_circle(&mut img, 0, 0, 5, RED);
        assert!(lit(&img, 0, 0));
        assert!(lit(&img, 3, 3));
    }

    #[rstest]
    #[case::empty("", 1, (0, 0))]
    #[case::single("A", 1, (5, 7))]
    #[case::pair("AB", 1, (11, 7))]
    #[case::scaled("REC", 2, (34, 14))]
    #[case::timer("00:01:05", 2, (94, 14))]
    fn test_measure_text(#[case] text: &str, #[case] scale: u32, #[case] expected: (u32, u32)) {
        assert_eq!(measure_text(text, scale), expected);
    }

    #[test]
    fn test_text_sits_on_baseline() {
        let mut img = blank(20, 20);
        // 'I' has a full-width top bar in row 0 and the stem in column 2.
        draw_text(&mut img, "I", 2, 15, 1, RED);
        assert!(lit(&img, 4, 8));
        assert!(lit(&img, 4, 14));
        assert!(!lit(&img, 4, 15));
        assert!(!lit(&img, 4, 7));
    }

    #[test]
    fn test_text_scale_blocks_pixels() {
        let mut img = blank(40, 40);
        draw_text(&mut img, "-", 0, 21, 3, RED);
        // '-' is row 3, which at scale 3 covers y = 0 + 9..12.
        for y in 9..12 {
            assert!(lit(&img, 0, y));
            assert!(lit(&img, 14, y));
        }
        assert!(!lit(&img, 0, 8));
        assert!(!lit(&img, 0, 12));
    }

    #[test]
    fn test_text_offscreen_does_not_panic() {
        let mut img = blank(10, 10);
        draw_text(&mut img, "OUTSIDE", -100, -100, 2, RED);
        draw_text(&mut img, "OUTSIDE", 5, 500, 2, RED);
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0]));
    }
}
