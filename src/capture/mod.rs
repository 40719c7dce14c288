//! Image acquisition
//!
//! Resolving block URLs to image bytes and natural dimensions.

pub mod resolver;

pub use resolver::{FsImageResolver, ImageResolver, KnownSizes, ResolveError, ResolvedImage};
