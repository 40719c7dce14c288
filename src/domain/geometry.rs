//! Coordinate spaces and the conversions between them
//!
//! Annotations are stored in normalized image space ([0,1] on both axes,
//! origin top-left). Surfaces project that space into CSS pixels, percentages
//! or page points.

use serde::{Deserialize, Serialize};

use super::image::NaturalSize;

/// A point in whatever space the caller is working in
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Clamp both axes into [0,1]
    pub fn clamped(self) -> Self {
        Self {
            x: clamp_unit(self.x),
            y: clamp_unit(self.y),
        }
    }

    /// Scale each axis independently
    pub fn scale(self, sx: f64, sy: f64) -> Self {
        Self {
            x: self.x * sx,
            y: self.y * sy,
        }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Screen-space bounding box of the rendered image, in CSS pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Convert a pointer position (client pixels) to clamped normalized coordinates
    pub fn normalize(&self, position: Point) -> Point {
        Point {
            x: pixel_to_normalized(position.x - self.left, self.width),
            y: pixel_to_normalized(position.y - self.top, self.height),
        }
    }

    /// Convert normalized coordinates back to client pixels
    pub fn to_pixels(&self, point: Point) -> Point {
        Point {
            x: self.left + point.x * self.width,
            y: self.top + point.y * self.height,
        }
    }
}

/// Clamp into [0,1]; NaN collapses to 0
#[inline]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Offset within a box of `extent_px` pixels to a clamped fraction
pub fn pixel_to_normalized(offset_px: f64, extent_px: f64) -> f64 {
    if extent_px.is_nan() || extent_px <= 0.0 {
        return 0.0;
    }
    clamp_unit(offset_px / extent_px)
}

/// Percentage string for CSS positioning, e.g. `0.25` -> `"25%"`
pub fn normalized_to_percent(n: f64) -> String {
    format!("{}%", fmt_num(n * 100.0))
}

/// Normalized coordinate to an absolute length along a rendered dimension
#[inline]
pub fn normalized_to_point(n: f64, rendered_dimension_pt: f64) -> f64 {
    n * rendered_dimension_pt
}

/// Height in points of an image rendered `width_pt` wide.
///
/// Unknown dimensions fall back to a square box.
pub fn rendered_height_pt(width_pt: f64, natural: Option<NaturalSize>) -> f64 {
    let natural = natural.unwrap_or(NaturalSize::FALLBACK);
    (width_pt * natural.aspect()).max(1.0)
}

/// Format a number with at most four decimals and no trailing zeros.
///
/// Used for every number written into markup or content streams so output
/// is byte-stable for identical input.
pub fn fmt_num(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let mut s = format!("{:.4}", value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}
