/// Per-tick drawing options, changed only by user commands.
///
/// Setters clamp out-of-range input instead of rejecting it.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderState {
    rect_color: [u8; 3],
    rect_thickness: u32,
    show_coordinates: bool,
    show_fps: bool,
    zoom_factor: f64,
    grayscale: bool,
}

pub const MIN_THICKNESS: u32 = 1;
pub const MAX_THICKNESS: u32 = 10;
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 2.0;

impl Default for RenderState {
    fn default() -> Self {
        Self {
            rect_color: [0, 255, 0],
            rect_thickness: 2,
            show_coordinates: false,
            show_fps: true,
            zoom_factor: 1.0,
            grayscale: false,
        }
    }
}

impl RenderState {
    pub fn rect_color(&self) -> [u8; 3] {
        self.rect_color
    }

    pub fn set_rect_color(&mut self, color: [u8; 3]) {
        self.rect_color = color;
    }

    pub fn rect_thickness(&self) -> u32 {
        self.rect_thickness
    }

    pub fn set_rect_thickness(&mut self, thickness: u32) {
        self.rect_thickness = thickness.clamp(MIN_THICKNESS, MAX_THICKNESS);
    }

    pub fn show_coordinates(&self) -> bool {
        self.show_coordinates
    }

    pub fn set_show_coordinates(&mut self, show: bool) {
        self.show_coordinates = show;
    }

    pub fn show_fps(&self) -> bool {
        self.show_fps
    }

    pub fn set_show_fps(&mut self, show: bool) {
        self.show_fps = show;
    }

    pub fn zoom_factor(&self) -> f64 {
        self.zoom_factor
    }

    /// Clamps into `[MIN_ZOOM, MAX_ZOOM]`. Non-finite input leaves the
    /// factor unchanged.
    pub fn set_zoom_factor(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom_factor = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn grayscale(&self) -> bool {
        self.grayscale
    }

    pub fn set_grayscale(&mut self, grayscale: bool) {
        self.grayscale = grayscale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let state = RenderState::default();
        assert_eq!(state.rect_color(), [0, 255, 0]);
        assert_eq!(state.rect_thickness(), 2);
        assert!(!state.show_coordinates());
        assert!(state.show_fps());
        assert_eq!(state.zoom_factor(), 1.0);
        assert!(!state.grayscale());
    }

    #[rstest]
    #[case::zero(0, 1)]
    #[case::in_range(7, 7)]
    #[case::too_thick(42, 10)]
    fn test_thickness_is_clamped(#[case] input: u32, #[case] expected: u32) {
        let mut state = RenderState::default();
        state.set_rect_thickness(input);
        assert_eq!(state.rect_thickness(), expected);
    }

    #[rstest]
    #[case::too_small(0.01, 0.1)]
    #[case::negative(-3.0, 0.1)]
    #[case::in_range(1.5, 1.5)]
    #[case::too_large(8.0, 2.0)]
    fn test_zoom_is_clamped(#[case] input: f64, #[case] expected: f64) {
        let mut state = RenderState::default();
        state.set_zoom_factor(input);
        assert_eq!(state.zoom_factor(), expected);
    }

    #[test]
    fn test_non_finite_zoom_is_ignored() {
        let mut state = RenderState::default();
        state.set_zoom_factor(1.4);
        state.set_zoom_factor(f64::NAN);
        state.set_zoom_factor(f64::INFINITY);
        assert_eq!(state.zoom_factor(), 1.4);
    }
}
