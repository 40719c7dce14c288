//! Pure domain types with minimal dependencies
//!
//! Nothing here knows about a particular rendering surface.

pub mod annotation;
pub mod geometry;
pub mod image;

pub use annotation::*;
pub use geometry::*;
pub use image::*;
