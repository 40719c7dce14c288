//! Whole-document exports
//!
//! This module provides:
//! - The block document snapshot, which is also a block property store
//! - Markup export of every image in the document
//! - Paginated vector export

pub mod document;
pub mod html;
pub mod paged;

pub use document::{Block, Document};
pub use html::export_markup;
pub use paged::{Page, PageImage, PagedExport, PagedExporter};
