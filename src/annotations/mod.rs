//! Annotation editing
//!
//! This module provides:
//! - The block property store the host exposes
//! - The interaction controller that turns pointer gestures into edits

pub mod controller;
pub mod store;

pub use controller::{DragState, Handle, InteractionController};
pub use store::{BlockPropertyStore, MemoryStore};
