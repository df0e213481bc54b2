//! Persistence adapters over a [`ContextWindow`](crate::context::ContextWindow).
//!
//! - [`text`]: versioned line-oriented save/load
//!   ([`ContextWindow::save`](crate::context::ContextWindow::save),
//!   [`ContextWindow::load`](crate::context::ContextWindow::load)).
//! - [`json`]: one-way JSON export
//!   ([`ContextWindow::to_json`](crate::context::ContextWindow::to_json),
//!   [`ContextWindow::export_json`](crate::context::ContextWindow::export_json)).
//!
//! Neither adapter changes eviction policy.

pub mod json;
pub mod text;

pub use json::JsonExport;
pub use text::{FORMAT_HEADER, read_text, write_text};
