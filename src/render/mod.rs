//! Annotation rendering module
//!
//! This module contains:
//! - Geometry calculations shared between all surfaces
//! - Width resolution from editor pixels to page points
//! - The live overlay for the editor
//! - Static markup export
//! - Vector page export

pub mod geometry;
pub mod markup;
pub mod overlay;
pub mod vector;
pub mod width;

use crate::domain::{AnnotationSet, ImageContext};

pub use markup::{MarkupFragment, StaticMarkupRenderer};
pub use overlay::{InteractiveRenderer, Overlay, PointerEvent};
pub use vector::{VectorFigure, VectorOp, VectorPageRenderer};
pub use width::{PageLayout, WidthResolver};

/// One way of drawing an image's annotations.
///
/// Implementations must place every annotation at the same relative position
/// and derive arrowheads through [`geometry::arrowhead`].
pub trait SurfaceRenderer {
    type Output;

    fn render(&self, image: &ImageContext, annotations: &AnnotationSet) -> Self::Output;
}
