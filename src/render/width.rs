//! Image width resolution for the paginated export
//!
//! Maps the width an image had in the editor onto the printable width of the
//! page, keeping the relative size of images when the page is narrower than
//! the editor.

use serde::{Deserialize, Serialize};

/// CSS pixels are 1/96 in, points are 1/72 in
pub const PIXELS_PER_POINT: f64 = 0.75;
pub const A4_WIDTH_PT: f64 = 595.28;
pub const A4_HEIGHT_PT: f64 = 841.89;
/// Default page padding on every side, in points
pub const DEFAULT_PAGE_PADDING_PT: f64 = 35.0;
/// Images within this many pixels of the editor width count as full width
pub const FULL_WIDTH_TOLERANCE_PX: f64 = 2.0;

/// Page geometry of the paginated export
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    pub width_pt: f64,
    pub height_pt: f64,
    pub padding_horizontal_pt: f64,
    pub padding_vertical_pt: f64,
    /// Point-per-pixel ratio used to move between editor and page units
    pub px_per_pt: f64,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            width_pt: A4_WIDTH_PT,
            height_pt: A4_HEIGHT_PT,
            padding_horizontal_pt: DEFAULT_PAGE_PADDING_PT,
            padding_vertical_pt: DEFAULT_PAGE_PADDING_PT,
            px_per_pt: PIXELS_PER_POINT,
        }
    }
}

impl PageLayout {
    /// Width between the horizontal paddings
    pub fn printable_width_pt(&self) -> f64 {
        (self.width_pt - 2.0 * self.padding_horizontal_pt).max(1.0)
    }

    /// Height between the vertical paddings
    pub fn printable_height_pt(&self) -> f64 {
        (self.height_pt - 2.0 * self.padding_vertical_pt).max(1.0)
    }

    /// Printable width expressed in editor pixels
    pub fn printable_width_px(&self) -> f64 {
        self.printable_width_pt() / self.px_per_pt
    }
}

/// Resolves the page width of an image from its editor width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthResolver {
    /// Width of the editor content area at export time
    pub editor_width_px: f64,
    pub tolerance_px: f64,
    pub layout: PageLayout,
}

impl WidthResolver {
    pub fn new(editor_width_px: f64, layout: PageLayout) -> Self {
        Self {
            editor_width_px,
            tolerance_px: FULL_WIDTH_TOLERANCE_PX,
            layout,
        }
    }

    pub fn with_tolerance(mut self, tolerance_px: f64) -> Self {
        self.tolerance_px = tolerance_px;
        self
    }

    /// Editor-to-page shrink factor, never above 1
    pub fn scale(&self) -> f64 {
        if !(self.editor_width_px.is_finite() && self.editor_width_px > 0.0) {
            return 1.0;
        }
        (self.layout.printable_width_px() / self.editor_width_px).min(1.0)
    }

    /// Absent widths and widths that (almost) fill the editor are full width
    pub fn is_full_width(&self, desired_px: Option<f64>) -> bool {
        match normalize_desired(desired_px) {
            None => true,
            Some(desired) => desired >= self.editor_width_px - self.tolerance_px,
        }
    }

    /// Display width on the page, in points
    pub fn resolve(&self, desired_px: Option<f64>) -> f64 {
        let max_width_pt = self.layout.printable_width_pt();
        let desired = match normalize_desired(desired_px) {
            Some(desired) if !self.is_full_width(Some(desired)) => desired,
            _ => return max_width_pt,
        };

        let target_px = desired * self.scale();
        (target_px * self.layout.px_per_pt).min(max_width_pt)
    }
}

fn normalize_desired(desired_px: Option<f64>) -> Option<f64> {
    desired_px.filter(|w| w.is_finite() && *w > 0.0)
}
