// THEORY:
// The `canvas` module is a tiny software rasteriser over `image::RgbImage`. It knows
// nothing about bins: it only fills shapes. Every primitive clips against the image
// bounds, so geometry that leaves the canvas is dropped rather than panicking.
//
// Pixels are sampled at their centres (x + 0.5, y + 0.5) for the curved and slanted
// shapes. Rects and horizontal lines are integer aligned and skip that step.

use image::{Rgb, RgbImage};

pub type Color = [u8; 3];

/// An integer, axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    /// One past the last column.
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// One past the last row.
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn center_x(&self) -> i32 {
        self.x + (self.width / 2) as i32
    }

    /// True when the rect lies entirely within a `width` x `height` canvas.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x as i64 + self.width as i64 <= width as i64
            && self.y as i64 + self.height as i64 <= height as i64
    }
}

/// Clamps a half-open span to `0..limit`.
fn clip_span(start: i64, end: i64, limit: u32) -> Option<(u32, u32)> {
    let start = start.max(0);
    let end = end.min(limit as i64);
    (start < end).then_some((start as u32, end as u32))
}

pub fn fill(image: &mut RgbImage, color: Color) {
    for pixel in image.pixels_mut() {
        *pixel = Rgb(color);
    }
}

pub fn fill_rect(image: &mut RgbImage, rect: Rect, color: Color) {
    let Some((x0, x1)) = clip_span(rect.left() as i64, rect.right() as i64, image.width()) else {
        return;
    };
    let Some((y0, y1)) = clip_span(rect.top() as i64, rect.bottom() as i64, image.height()) else {
        return;
    };
    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, Rgb(color));
        }
    }
}

/// Draws a horizontal band `thickness` rows tall starting at row `y`, spanning `x0..x1`.
pub fn hline(image: &mut RgbImage, x0: i32, x1: i32, y: i32, thickness: u32, color: Color) {
    fill_rect(
        image,
        Rect::new(x0, y, (x1 - x0).max(0) as u32, thickness),
        color,
    );
}

/// Fills a polygon using the even-odd rule.
pub fn fill_polygon(image: &mut RgbImage, points: &[(f64, f64)], color: Color) {
    if points.len() < 3 {
        return;
    }
    let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);
    let Some((y0, y1)) = clip_span(min_y.floor() as i64, max_y.ceil() as i64, image.height())
    else {
        return;
    };

    let mut crossings: Vec<f64> = Vec::with_capacity(points.len());
    for y in y0..y1 {
        let scan_y = y as f64 + 0.5;
        crossings.clear();
        for (i, &(ax, ay)) in points.iter().enumerate() {
            let (bx, by) = points[(i + 1) % points.len()];
            if (ay <= scan_y && by > scan_y) || (by <= scan_y && ay > scan_y) {
                let t = (scan_y - ay) / (by - ay);
                crossings.push(ax + t * (bx - ax));
            }
        }
        crossings.sort_by(f64::total_cmp);
        for pair in crossings.chunks_exact(2) {
            // Pixel centres inside [pair[0], pair[1]).
            let start = (pair[0] - 0.5).ceil() as i64;
            let end = (pair[1] - 0.5).ceil() as i64;
            if let Some((x0, x1)) = clip_span(start, end, image.width()) {
                for x in x0..x1 {
                    image.put_pixel(x, y, Rgb(color));
                }
            }
        }
    }
}

/// Visits every pixel whose offset from `(cx, cy)` lies within `radius`.
fn for_each_in_disc(
    image: &mut RgbImage,
    cx: f64,
    cy: f64,
    radius: f64,
    mut paint: impl FnMut(&mut Rgb<u8>),
) {
    if radius <= 0.0 {
        return;
    }
    let (left, right) = ((cx - radius).floor() as i64, (cx + radius).ceil() as i64 + 1);
    let (top, bottom) = ((cy - radius).floor() as i64, (cy + radius).ceil() as i64 + 1);
    let span_x = clip_span(left, right, image.width());
    let span_y = clip_span(top, bottom, image.height());
    let (Some((x0, x1)), Some((y0, y1))) = (span_x, span_y) else {
        return;
    };
    let radius_sq = radius * radius;
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            if dx * dx + dy * dy <= radius_sq {
                paint(image.get_pixel_mut(x, y));
            }
        }
    }
}

pub fn fill_circle(image: &mut RgbImage, cx: f64, cy: f64, radius: f64, color: Color) {
    for_each_in_disc(image, cx, cy, radius, |pixel| *pixel = Rgb(color));
}

/// Composites a disc of `color` at `alpha` (0 transparent, 255 opaque) over the image.
pub fn blend_circle(image: &mut RgbImage, cx: f64, cy: f64, radius: f64, color: Color, alpha: u8) {
    let a = alpha as u32;
    for_each_in_disc(image, cx, cy, radius, |pixel| {
        for (dst, src) in pixel.0.iter_mut().zip(color) {
            *dst = ((src as u32 * a + *dst as u32 * (255 - a) + 127) / 255) as u8;
        }
    });
}

fn inside_rounded(rect: Rect, radius: f64, px: f64, py: f64) -> bool {
    let left = rect.left() as f64;
    let top = rect.top() as f64;
    let right = rect.right() as f64;
    let bottom = rect.bottom() as f64;
    if px < left || px >= right || py < top || py >= bottom {
        return false;
    }
    let radius = radius.min((right - left) / 2.0).min((bottom - top) / 2.0).max(0.0);
    let nearest_x = px.clamp(left + radius, right - radius);
    let nearest_y = py.clamp(top + radius, bottom - radius);
    let dx = px - nearest_x;
    let dy = py - nearest_y;
    dx * dx + dy * dy <= radius * radius
}

/// Fills a rounded rect and strokes a `border_width` outline inside its edge.
pub fn rounded_rect(
    image: &mut RgbImage,
    rect: Rect,
    radius: u32,
    fill_color: Color,
    border_color: Color,
    border_width: u32,
) {
    let inner = Rect::new(
        rect.x + border_width as i32,
        rect.y + border_width as i32,
        rect.width.saturating_sub(2 * border_width),
        rect.height.saturating_sub(2 * border_width),
    );
    let inner_radius = radius.saturating_sub(border_width) as f64;
    let Some((x0, x1)) = clip_span(rect.left() as i64, rect.right() as i64, image.width()) else {
        return;
    };
    let Some((y0, y1)) = clip_span(rect.top() as i64, rect.bottom() as i64, image.height()) else {
        return;
    };
    for y in y0..y1 {
        for x in x0..x1 {
            let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
            if !inside_rounded(rect, radius as f64, px, py) {
                continue;
            }
            let color = if inside_rounded(inner, inner_radius, px, py) {
                fill_color
            } else {
                border_color
            };
            image.put_pixel(x, y, Rgb(color));
        }
    }
}
