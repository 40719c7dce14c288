//! Dot and arrow annotations over images in a block document.
//!
//! Annotations are stored as a JSON string on the image block and drawn by
//! three renderers: the live editor overlay, static markup and a paginated
//! vector export.

pub mod annotations;
pub mod capture;
pub mod config;
pub mod domain;
pub mod export;
pub mod render;
