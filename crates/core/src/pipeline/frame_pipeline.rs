use chrono::{DateTime, Local};
use image::RgbImage;

use crate::detection::domain::face_detector::{DetectionParams, FaceDetector};
use crate::rendering::domain::fps_meter::FpsMeter;
use crate::rendering::domain::render_state::RenderState;
use crate::rendering::infrastructure::frame_transform::{desaturate, luminance, mirror, zoom};
use crate::rendering::infrastructure::overlay_painter::{
    draw_rect, draw_text, fill_circle, measure_text,
};
use crate::shared::frame::Frame;
use crate::shared::region::BoundingBox;
use crate::shared::timestamp::display_timestamp;

const WHITE: [u8; 3] = [255, 255, 255];
const YELLOW: [u8; 3] = [255, 255, 0];
const GRAY: [u8; 3] = [200, 200, 200];
const RED: [u8; 3] = [255, 0, 0];

const COORD_SCALE: u32 = 1;
const FPS_SCALE: u32 = 3;
const STATUS_SCALE: u32 = 2;

/// Gap between the top of a box and the baseline of its coordinate label.
const COORD_OFFSET: i32 = 10;
const MARGIN: i32 = 10;
const FPS_BASELINE: i32 = 30;
const DATE_FROM_BOTTOM: i32 = 10;
const LOCATION_FROM_BOTTOM: i32 = 40;

const REC_MARKER: (i32, i32) = (20, 60);
const REC_MARKER_RADIUS: u32 = 10;
const REC_LABEL_X: i32 = 40;
const REC_BASELINE: i32 = 65;
const ELAPSED_X: i32 = 100;
const LOCATION_GAP: i32 = 12;

/// Turns a raw capture into the annotated frame that is displayed and,
/// while recording, encoded.
///
/// Owns the detector and the FPS reference point, so it is the only
/// stateful step of a tick besides the devices themselves.
pub struct FramePipeline {
    detector: Box<dyn FaceDetector>,
    params: DetectionParams,
    fps_meter: FpsMeter,
    location: String,
}

impl FramePipeline {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        params: DetectionParams,
        location: String,
        start: DateTime<Local>,
    ) -> Self {
        Self {
            detector,
            params,
            fps_meter: FpsMeter::new(start),
            location,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Restarts FPS measurement, so a pause does not read as one slow frame.
    pub fn reset_clock(&mut self, now: DateTime<Local>) {
        self.fps_meter.reset(now);
    }

    /// Mirror, optional desaturation and optional zoom. Zoom at or below
    /// 1.0 leaves the mirrored pixels untouched.
    pub fn prepare(image: &RgbImage, state: &RenderState) -> RgbImage {
        let mut prepared = mirror(image);
        if state.grayscale() {
            prepared = desaturate(&prepared);
        }
        if let Some(zoomed) = zoom(&prepared, state.zoom_factor()) {
            prepared = zoomed;
        }
        prepared
    }

    /// Runs every step of a tick over `frame`.
    ///
    /// `recording_elapsed` is the `HH:MM:SS` label while a recording is
    /// active; it moves the location text out of the indicator's way.
    pub fn process(
        &mut self,
        frame: &Frame,
        state: &RenderState,
        now: DateTime<Local>,
        recording_elapsed: Option<&str>,
    ) -> Frame {
        let mut image = Self::prepare(frame.image(), state);

        let boxes = self.detect(&image);
        for b in &boxes {
            draw_rect(&mut image, b, state.rect_color(), state.rect_thickness());
            if state.show_coordinates() {
                let label = format!("{},{}", b.x, b.y);
                draw_text(&mut image, &label, b.x, b.y - COORD_OFFSET, COORD_SCALE, WHITE);
            }
        }

        let fps = self.fps_meter.tick(now);
        if state.show_fps() {
            let label = format!("FPS: {}", fps as u64);
            draw_text(&mut image, &label, MARGIN, FPS_BASELINE, FPS_SCALE, YELLOW);
        }

        let height = image.height() as i32;
        draw_text(
            &mut image,
            &display_timestamp(&now),
            MARGIN,
            height - DATE_FROM_BOTTOM,
            STATUS_SCALE,
            GRAY,
        );

        match recording_elapsed {
            Some(elapsed) => {
                let (cx, cy) = REC_MARKER;
                fill_circle(&mut image, cx, cy, REC_MARKER_RADIUS, RED);
                draw_text(&mut image, "REC", REC_LABEL_X, REC_BASELINE, STATUS_SCALE, RED);
                draw_text(&mut image, elapsed, ELAPSED_X, REC_BASELINE, STATUS_SCALE, WHITE);
                let (elapsed_width, _) = measure_text(elapsed, STATUS_SCALE);
                let location_x = ELAPSED_X + elapsed_width as i32 + LOCATION_GAP;
                draw_text(
                    &mut image,
                    &self.location,
                    location_x,
                    REC_BASELINE,
                    STATUS_SCALE,
                    GRAY,
                );
            }
            None => draw_text(
                &mut image,
                &self.location,
                MARGIN,
                height - LOCATION_FROM_BOTTOM,
                STATUS_SCALE,
                GRAY,
            ),
        }

        Frame::new(image, frame.index())
    }

    fn detect(&mut self, image: &RgbImage) -> Vec<BoundingBox> {
        let gray = luminance(image);
        match self.detector.detect(&gray, &self.params) {
            Ok(boxes) => boxes,
            Err(e) => {
                log::warn!("Face detection failed, drawing no boxes: {e}");
                Vec::new()
            }
        }
    }
}
