//! Shared geometry calculations for annotations
//!
//! This module contains constants and math shared between the live overlay,
//! the static markup and the vector page export. Every surface derives arrow
//! heads through [`arrowhead`] so they cannot drift apart.

use crate::domain::Point;

/// Arrow geometry constants
pub mod arrow {
    /// Arrowhead length as a fraction of the rendered image width
    pub const HEAD_LENGTH_FRACTION: f64 = 0.022;
    /// Angle between the shaft and each wing
    pub const DEFAULT_WING_ANGLE_DEG: f64 = 30.0;
    /// Shaft and head stroke width (CSS px in markup, pt in page export)
    pub const STROKE_WIDTH: f64 = 3.0;
}

/// Dot geometry constants
pub mod dot {
    /// Radius of the filled dot in the page export, in points
    pub const RADIUS_PT: f64 = 5.0;
    /// Diameter of the dot marker in markup, in CSS px
    pub const MARKER_PX: f64 = 14.0;
    /// Control point distance for a circle from four cubic Beziers
    pub const BEZIER_K: f32 = 0.552_284_8;
}

/// Fixed annotation color (#ff7a00)
pub const ANNOTATION_RGB: [u8; 3] = [0xff, 0x7a, 0x00];

pub fn annotation_hex() -> String {
    let [r, g, b] = ANNOTATION_RGB;
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// The three points that define an arrowhead
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrowHead {
    pub tip: Point,
    pub left_wing: Point,
    pub right_wing: Point,
}

impl ArrowHead {
    pub fn points(&self) -> [Point; 3] {
        [self.tip, self.left_wing, self.right_wing]
    }
}

/// Calculate the arrowhead for a shaft running from `origin` to `terminus`.
///
/// Unit agnostic: the caller picks the space, which must be isotropic for the
/// wings to look symmetric. A zero-length shaft points along +x.
pub fn arrowhead(
    origin: Point,
    terminus: Point,
    head_length: f64,
    wing_angle_deg: f64,
) -> ArrowHead {
    let angle = (terminus.y - origin.y).atan2(terminus.x - origin.x);
    let wing = wing_angle_deg.to_radians();

    let left = angle - wing;
    let right = angle + wing;

    ArrowHead {
        tip: terminus,
        left_wing: Point::new(
            terminus.x - head_length * left.cos(),
            terminus.y - head_length * left.sin(),
        ),
        right_wing: Point::new(
            terminus.x - head_length * right.cos(),
            terminus.y - head_length * right.sin(),
        ),
    }
}

/// Percentage-based drawing space used by the overlay and the markup.
///
/// x runs 0..100 across the image and y runs 0..100*aspect down it, so one
/// unit is the same physical length on both axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PercentSpace {
    /// Image height over width
    pub aspect: f64,
}

impl PercentSpace {
    pub fn new(aspect: f64) -> Self {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        Self { aspect }
    }

    pub fn width(&self) -> f64 {
        100.0
    }

    pub fn height(&self) -> f64 {
        100.0 * self.aspect
    }

    pub fn project(&self, p: Point) -> Point {
        p.scale(self.width(), self.height())
    }

    pub fn unproject(&self, p: Point) -> Point {
        p.scale(1.0 / self.width(), 1.0 / self.height())
    }

    pub fn head_length(&self) -> f64 {
        arrow::HEAD_LENGTH_FRACTION * self.width()
    }

    /// Arrowhead for a normalized arrow, in this space
    pub fn arrowhead(&self, origin: Point, terminus: Point) -> ArrowHead {
        arrowhead(
            self.project(origin),
            self.project(terminus),
            self.head_length(),
            arrow::DEFAULT_WING_ANGLE_DEG,
        )
    }
}
