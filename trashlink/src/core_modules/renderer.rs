// THEORY:
// The `renderer` module turns one complete snapshot of visual parameters into one
// RGB frame. It is the leaf of the system and is deliberately stateless: a
// `BinRenderer` only carries its layout (`BinGeometry`), fixed at construction, and
// every call to `render` paints a brand new image. Nothing a caller does with a
// returned frame can affect the next one.
//
// Painting is strictly back to front:
//   background -> warning light -> bin base -> right perspective face ->
//   compartments -> compartment rims -> sensor plate -> fill columns -> lid ->
//   falling item
//
// Only two things here are load-bearing: the compartment assignment (biomedical
// left, general right) and the proportionality of the fill columns. Colours and
// gradients are cosmetic.

use crate::core_modules::bin_state::{
    BinState, FallingItem, LID_OPEN_DEGREES, LidState, WasteKind,
};
use crate::core_modules::canvas::{self, Color, Rect};
use crate::core_modules::status::warning_light_active;
use crate::error::{BinError, Result};
use image::RgbImage;

/// One rendered image of the bin.
pub type Frame = RgbImage;

const BG_COLOR: Color = [240, 240, 240];
const BIN_HIGHLIGHT: Color = [220, 220, 220];
const BIN_SHADOW: Color = [140, 140, 140];
const RED_BIN_HIGHLIGHT: Color = [255, 200, 200];
const RED_BIN_SHADOW: Color = [180, 120, 120];
const GREEN_BIN_HIGHLIGHT: Color = [200, 255, 200];
const GREEN_BIN_SHADOW: Color = [120, 180, 120];
const SENSOR_COLOR: Color = [120, 120, 120];
const SENSOR_RIM: Color = [160, 160, 160];
const LID_COLOR: Color = [160, 160, 160];
const LID_HIGHLIGHT: Color = [200, 200, 200];
const WARNING_COLOR: Color = [255, 0, 0];

const RIM_THICKNESS: u32 = 3;
const SENSOR_RIM_WIDTH: u32 = 2;

/// Layout of the bin on the canvas. All values are in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct BinGeometry {
    pub width: u32,
    pub height: u32,
    /// Front face of the bin body, both compartments included.
    pub body: Rect,
    /// How far the perspective faces recede up and to the right.
    pub depth: u32,
    /// The closed lid sits directly on top of `body` with this height.
    pub lid_height: u32,
    /// Gap on each side of the centre divider.
    pub divider_gap: u32,
    /// Horizontal inset of a fill column inside its compartment.
    pub fill_inset: u32,
    pub sensor: Rect,
    pub sensor_radius: u32,
    pub warning_center: (f64, f64),
    pub warning_radius: f64,
    /// Glow rings drawn behind the warning light, outermost first.
    pub warning_glow: [f64; 3],
    pub item_radius: f64,
}

impl Default for BinGeometry {
    fn default() -> Self {
        let width = 400;
        Self {
            width,
            height: 500,
            body: Rect::new(50, 150, 300, 300),
            depth: 40,
            lid_height: 20,
            divider_gap: 2,
            fill_inset: 5,
            sensor: Rect::new(150, 100, 100, 20),
            sensor_radius: 5,
            warning_center: (width as f64 - 30.0, 30.0),
            warning_radius: 10.0,
            warning_glow: [20.0, 15.0, 10.0],
            item_radius: 10.0,
        }
    }
}

impl BinGeometry {
    pub fn lid(&self) -> Rect {
        Rect::new(
            self.body.x,
            self.body.y - self.lid_height as i32,
            self.body.width,
            self.lid_height,
        )
    }

    pub fn compartment(&self, kind: WasteKind) -> Rect {
        let half = (self.body.width / 2).saturating_sub(self.divider_gap);
        match kind {
            WasteKind::Biomedical => Rect::new(self.body.x, self.body.y, half, self.body.height),
            WasteKind::General => Rect::new(
                self.body.center_x() + self.divider_gap as i32,
                self.body.y,
                half,
                self.body.height,
            ),
        }
    }

    pub fn compartment_height(&self) -> u32 {
        self.body.height
    }

    /// Horizontal centre of the canvas, where falling items start.
    pub fn center_x(&self) -> f64 {
        (self.width / 2) as f64
    }

    /// Where an item of `kind` ends its sideways drift.
    pub fn drop_target_x(&self, kind: WasteKind) -> f64 {
        match kind {
            WasteKind::Biomedical => (self.width / 4) as f64,
            WasteKind::General => (3 * self.width / 4) as f64,
        }
    }

    fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(BinError::InvalidGeometry(msg));
        if self.width == 0 || self.height == 0 {
            return invalid(format!("canvas must be non-empty, got {}x{}", self.width, self.height));
        }
        if !self.body.fits_within(self.width, self.height) {
            return invalid(format!("bin body {:?} leaves the canvas", self.body));
        }
        if self.body.height == 0 {
            return invalid("bin body has no height".to_string());
        }
        // The lid shares the body's columns, so only its top edge can escape.
        if (self.body.y as i64) < self.lid_height as i64 {
            return invalid(format!(
                "a {}px lid does not fit above a body starting at row {}",
                self.lid_height, self.body.y
            ));
        }
        if !self.sensor.fits_within(self.width, self.height) {
            return invalid(format!("sensor {:?} leaves the canvas", self.sensor));
        }
        let half = (self.body.width / 2).saturating_sub(self.divider_gap);
        if half as u64 <= 2 * self.fill_inset as u64 {
            return invalid(format!(
                "compartments are {half}px wide, too narrow for a {}px fill inset",
                self.fill_inset
            ));
        }
        Ok(())
    }
}

/// Colour of fill row `row` (0 is the bottom row) in a compartment of `kind`.
/// Rows warm up towards the top to suggest depth.
pub(crate) fn fill_color(kind: WasteKind, row: u32) -> Color {
    let rising = (200 + row / 3).min(255) as u8;
    let fading = 100u32.saturating_sub(row / 2) as u8;
    match kind {
        WasteKind::Biomedical => [rising, fading, fading],
        WasteKind::General => [fading, rising, fading],
    }
}

/// Paints bin frames from visual snapshots.
#[derive(Debug, Clone)]
pub struct BinRenderer {
    geometry: BinGeometry,
}

impl Default for BinRenderer {
    fn default() -> Self {
        Self {
            geometry: BinGeometry::default(),
        }
    }
}

impl BinRenderer {
    /// Builds a renderer for `geometry`, rejecting layouts that cannot be drawn.
    pub fn new(geometry: BinGeometry) -> Result<Self> {
        geometry.validate()?;
        Ok(Self { geometry })
    }

    pub fn geometry(&self) -> &BinGeometry {
        &self.geometry
    }

    /// Pixel height of a fill column at `level` percent.
    pub fn fill_height(&self, level: u8) -> u32 {
        let ratio = level.min(100) as f64 / 100.0;
        (ratio * self.geometry.compartment_height() as f64).round() as u32
    }

    /// Convenience wrapper around [`BinRenderer::render`] for typed state.
    pub fn render_state(
        &self,
        state: &BinState,
        lid: LidState,
        item: Option<&FallingItem>,
    ) -> Frame {
        self.render(state.biomedical_level, state.general_level, lid.angle_degrees, item)
    }

    /// Renders one frame. Levels are percentages in `0..=100` and `lid_angle`
    /// is in degrees in `0..=90`.
    pub fn render(
        &self,
        biomedical_level: u8,
        general_level: u8,
        lid_angle: f64,
        falling_item: Option<&FallingItem>,
    ) -> Frame {
        let g = &self.geometry;
        let mut frame = RgbImage::new(g.width, g.height);
        canvas::fill(&mut frame, BG_COLOR);

        if warning_light_active(biomedical_level, general_level) {
            self.draw_warning_light(&mut frame);
        }
        self.draw_body(&mut frame);
        self.draw_sensor(&mut frame);
        self.draw_fill(&mut frame, WasteKind::Biomedical, biomedical_level);
        self.draw_fill(&mut frame, WasteKind::General, general_level);
        self.draw_lid(&mut frame, lid_angle);

        if let Some(item) = falling_item {
            canvas::fill_circle(&mut frame, item.x, item.y, g.item_radius, item.kind.color());
        }
        frame
    }

    fn draw_warning_light(&self, frame: &mut Frame) {
        let g = &self.geometry;
        let (cx, cy) = g.warning_center;
        for radius in g.warning_glow {
            // Inner rings are more opaque, so the glow brightens towards the light.
            let alpha = (100.0 - radius * 4.0).clamp(0.0, 255.0) as u8;
            canvas::blend_circle(frame, cx, cy, radius, WARNING_COLOR, alpha);
        }
        canvas::fill_circle(frame, cx, cy, g.warning_radius, WARNING_COLOR);
    }

    fn draw_body(&self, frame: &mut Frame) {
        let g = &self.geometry;
        let body = g.body;
        let depth = g.depth as f64;
        let (left, right) = (body.left() as f64, body.right() as f64);
        let (top, bottom) = (body.top() as f64, body.bottom() as f64);

        canvas::fill_polygon(
            frame,
            &[
                (left + depth, bottom - depth),
                (right + depth, bottom - depth),
                (right, bottom),
                (left, bottom),
            ],
            BIN_SHADOW,
        );
        canvas::fill_polygon(
            frame,
            &[
                (right, top),
                (right + depth, top - depth),
                (right + depth, bottom - depth),
                (right, bottom),
            ],
            BIN_HIGHLIGHT,
        );

        for (kind, shadow, rim) in [
            (WasteKind::Biomedical, RED_BIN_SHADOW, RED_BIN_HIGHLIGHT),
            (WasteKind::General, GREEN_BIN_SHADOW, GREEN_BIN_HIGHLIGHT),
        ] {
            let compartment = g.compartment(kind);
            canvas::fill_rect(frame, compartment, shadow);
            canvas::hline(
                frame,
                compartment.left(),
                compartment.right(),
                compartment.top(),
                RIM_THICKNESS,
                rim,
            );
        }
    }

    fn draw_sensor(&self, frame: &mut Frame) {
        let g = &self.geometry;
        canvas::rounded_rect(
            frame,
            g.sensor,
            g.sensor_radius,
            SENSOR_COLOR,
            SENSOR_RIM,
            SENSOR_RIM_WIDTH,
        );
    }

    fn draw_fill(&self, frame: &mut Frame, kind: WasteKind, level: u8) {
        let compartment = self.geometry.compartment(kind);
        let inset = self.geometry.fill_inset as i32;
        for row in 0..self.fill_height(level) {
            canvas::hline(
                frame,
                compartment.left() + inset,
                compartment.right() - inset,
                compartment.bottom() - row as i32 - 1,
                1,
                fill_color(kind, row),
            );
        }
    }

    fn draw_lid(&self, frame: &mut Frame, angle: f64) {
        let lid = self.geometry.lid();
        if angle <= 0.0 {
            canvas::fill_rect(frame, lid, LID_COLOR);
            canvas::hline(frame, lid.left(), lid.right(), lid.top(), RIM_THICKNESS, LID_HIGHLIGHT);
            return;
        }

        // The lid tips forward and away, so only its projected height remains visible.
        let angle = angle.min(LID_OPEN_DEGREES);
        let visible = (lid.height as f64 * angle.to_radians().cos().abs()).round() as u32;
        if visible == 0 {
            return;
        }
        let shade = (160.0 + angle / LID_OPEN_DEGREES * 40.0) as u8;
        canvas::fill_rect(
            frame,
            Rect::new(lid.x, lid.y, lid.width, visible),
            [shade, shade, shade],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts the contiguous fill rows at the bottom of a compartment.
    fn measured_fill(renderer: &BinRenderer, frame: &Frame, kind: WasteKind) -> u32 {
        let compartment = renderer.geometry().compartment(kind);
        let x = compartment.center_x() as u32;
        let mut rows = 0;
        while rows < compartment.height {
            let y = (compartment.bottom() - rows as i32 - 1) as u32;
            if frame.get_pixel(x, y).0 != fill_color(kind, rows) {
                break;
            }
            rows += 1;
        }
        rows
    }

    fn warning_pixel(renderer: &BinRenderer, frame: &Frame) -> Color {
        let (cx, cy) = renderer.geometry().warning_center;
        frame.get_pixel(cx as u32, cy as u32).0
    }

    #[test]
    fn fill_height_is_monotonic_with_exact_endpoints() {
        let renderer = BinRenderer::default();
        assert_eq!(renderer.fill_height(0), 0);
        assert_eq!(renderer.fill_height(100), renderer.geometry().compartment_height());
        let mut previous = 0;
        for level in 0..=100u8 {
            let height = renderer.fill_height(level);
            assert!(height >= previous, "fill shrank at level {level}");
            previous = height;
        }
    }

    #[test]
    fn fill_columns_are_drawn_in_their_own_compartment() {
        let renderer = BinRenderer::default();
        for (bio, gen_level) in [(0, 0), (20, 0), (0, 40), (55, 99), (100, 100), (99, 1)] {
            let frame = renderer.render(bio, gen_level, 0.0, None);
            assert_eq!(
                measured_fill(&renderer, &frame, WasteKind::Biomedical),
                renderer.fill_height(bio),
                "biomedical column at {bio}"
            );
            assert_eq!(
                measured_fill(&renderer, &frame, WasteKind::General),
                renderer.fill_height(gen_level),
                "general column at {gen_level}"
            );
        }
    }

    #[test]
    fn empty_compartments_show_their_shadow_colour() {
        let renderer = BinRenderer::default();
        let frame = renderer.render(0, 0, 0.0, None);
        let left = renderer.geometry().compartment(WasteKind::Biomedical);
        let right = renderer.geometry().compartment(WasteKind::General);
        let y = (left.bottom() - 1) as u32;
        assert_eq!(frame.get_pixel(left.center_x() as u32, y).0, RED_BIN_SHADOW);
        assert_eq!(frame.get_pixel(right.center_x() as u32, y).0, GREEN_BIN_SHADOW);
    }

    #[test]
    fn warning_light_tracks_the_ninety_percent_boundary() {
        let renderer = BinRenderer::default();
        let cases = [
            (89, 89, false),
            (90, 0, true),
            (0, 90, true),
            (89, 90, true),
            (90, 89, true),
            (100, 100, true),
            (0, 0, false),
            (80, 85, false),
        ];
        for (bio, gen_level, lit) in cases {
            let frame = renderer.render(bio, gen_level, 0.0, None);
            let expected = if lit { WARNING_COLOR } else { BG_COLOR };
            assert_eq!(warning_pixel(&renderer, &frame), expected, "levels ({bio}, {gen_level})");
        }
    }

    #[test]
    fn lid_foreshortens_as_it_opens() {
        let renderer = BinRenderer::default();
        let lid = renderer.geometry().lid();
        let probe_x = (lid.left() + 10) as u32;
        let bottom_row = (lid.bottom() - 1) as u32;

        let closed = renderer.render(0, 0, 0.0, None);
        assert_eq!(closed.get_pixel(probe_x, lid.top() as u32).0, LID_HIGHLIGHT);
        assert_eq!(closed.get_pixel(probe_x, bottom_row).0, LID_COLOR);

        // At 60 degrees only half of the lid is visible.
        let tilted = renderer.render(0, 0, 60.0, None);
        assert_ne!(tilted.get_pixel(probe_x, lid.top() as u32).0, BG_COLOR);
        assert_eq!(tilted.get_pixel(probe_x, bottom_row).0, BG_COLOR);
        assert_ne!(tilted.get_pixel(probe_x, (lid.top() + 9) as u32).0, BG_COLOR);
        assert_eq!(tilted.get_pixel(probe_x, (lid.top() + 10) as u32).0, BG_COLOR);

        let open = renderer.render(0, 0, 90.0, None);
        for y in lid.top()..lid.bottom() {
            assert_eq!(open.get_pixel(probe_x, y as u32).0, BG_COLOR);
        }
    }

    #[test]
    fn falling_item_is_coloured_by_kind() {
        let renderer = BinRenderer::default();
        for kind in WasteKind::ALL {
            let item = FallingItem { kind, x: 200.0, y: 60.0 };
            let frame = renderer.render(0, 0, 0.0, Some(&item));
            assert_eq!(frame.get_pixel(200, 60).0, kind.color());
        }
        let frame = renderer.render(0, 0, 0.0, None);
        assert_eq!(frame.get_pixel(200, 60).0, BG_COLOR);
    }

    #[test]
    fn render_is_pure() {
        let renderer = BinRenderer::default();
        let item = FallingItem { kind: WasteKind::General, x: 150.0, y: 200.0 };
        let first = renderer.render(40, 60, 33.0, Some(&item));
        let _other = renderer.render(100, 100, 90.0, None);
        let second = renderer.render(40, 60, 33.0, Some(&item));
        assert_eq!(first, second);
        assert_eq!(first.dimensions(), (400, 500));
    }

    #[test]
    fn rejects_geometry_that_leaves_the_canvas() {
        let mut geometry = BinGeometry::default();
        geometry.body = Rect::new(50, 150, 300, 400);
        assert!(matches!(BinRenderer::new(geometry), Err(BinError::InvalidGeometry(_))));

        let mut geometry = BinGeometry::default();
        geometry.body = Rect::new(50, 10, 300, 300);
        assert!(matches!(BinRenderer::new(geometry), Err(BinError::InvalidGeometry(_))));

        let mut geometry = BinGeometry::default();
        geometry.width = 0;
        assert!(BinRenderer::new(geometry).is_err());

        assert!(BinRenderer::new(BinGeometry::default()).is_ok());
    }

    #[test]
    fn oversized_geometry_is_rejected_without_overflowing() {
        let cases = [
            BinGeometry { fill_inset: u32::MAX / 2 + 1, ..BinGeometry::default() },
            BinGeometry { body: Rect::new(i32::MAX, 150, 300, 300), ..BinGeometry::default() },
            BinGeometry { body: Rect::new(50, i32::MAX, 300, 300), ..BinGeometry::default() },
            BinGeometry { body: Rect::new(50, 150, u32::MAX, 300), ..BinGeometry::default() },
            BinGeometry { sensor: Rect::new(i32::MAX, 100, 100, 20), ..BinGeometry::default() },
            BinGeometry { lid_height: u32::MAX, ..BinGeometry::default() },
            BinGeometry { divider_gap: u32::MAX, ..BinGeometry::default() },
        ];
        for geometry in cases {
            let described = format!("{geometry:?}");
            assert!(
                matches!(BinRenderer::new(geometry), Err(BinError::InvalidGeometry(_))),
                "accepted {described}"
            );
        }
    }

    #[test]
    fn fill_height_rounds_to_the_nearest_row() {
        let geometry = BinGeometry {
            body: Rect::new(50, 150, 300, 7),
            ..BinGeometry::default()
        };
        let renderer = BinRenderer::new(geometry).unwrap();
        // 3.5 rows and 0.7 rows: truncation would give 3 and 0.
        assert_eq!(renderer.fill_height(50), 4);
        assert_eq!(renderer.fill_height(10), 1);
        assert_eq!(renderer.fill_height(7), 0);
        assert_eq!(renderer.fill_height(100), 7);

        let frame = renderer.render(50, 10, 0.0, None);
        assert_eq!(measured_fill(&renderer, &frame, WasteKind::Biomedical), 4);
        assert_eq!(measured_fill(&renderer, &frame, WasteKind::General), 1);
    }
}
