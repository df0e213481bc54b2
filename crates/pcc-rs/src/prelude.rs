//! Convenience re-exports for common `pcc-rs` types.
//!
//! Meant to be glob-imported:
//!
//! ```ignore
//! use pcc_rs::prelude::*;
//! ```
//!
//! This pulls in the window, its configuration, the message types, and the
//! error type. Lower-level pieces (the message store, eviction outcomes, the
//! text codec functions) are left out; import those from their modules.

// ── Core types ──────────────────────────────────────────────────────
pub use crate::{Error, Message, MessageKind, Priority};

// ── Window ──────────────────────────────────────────────────────────
pub use crate::context::{ContextUsage, ContextWindow, MessageId, estimate_tokens};

// ── Configuration and metrics ───────────────────────────────────────
pub use crate::config::{CompressionStrategy, WindowConfig};
pub use crate::metrics::MetricsSnapshot;

// ── Sharing ─────────────────────────────────────────────────────────
pub use crate::sync::SharedWindow;
