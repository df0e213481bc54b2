//! Priority-aware token budgeting for LLM conversation context.
//!
//! `pcc-rs` (Prompt Context Controller) keeps a growing conversation inside a
//! fixed token budget so a downstream model call never exceeds its input
//! limit. Every message carries a [`Priority`]; when the budget would be
//! exceeded the window compresses itself in priority order and, only as a
//! last resort, evicts the oldest messages regardless of priority.
//!
//! # Getting started
//!
//! ```
//! use pcc_rs::prelude::*;
//!
//! let mut window = ContextWindow::new(1000)?;
//! window.add_message(MessageKind::System, Priority::Critical, "You are a helpful assistant.")?;
//! window.add_message(MessageKind::User, Priority::High, "What is the capital of France?")?;
//! window.add_message(MessageKind::Assistant, Priority::Normal, "Paris.")?;
//!
//! assert_eq!(window.message_count(), 3);
//! assert!(window.context().starts_with("System: You are a helpful assistant.\n"));
//! # Ok::<(), pcc_rs::Error>(())
//! ```
//!
//! # Where to find things
//!
//! - **Insert, remove, and read messages:** [`ContextWindow`](context::ContextWindow).
//! - **Tune the budget and compression:** [`WindowConfig`](config::WindowConfig)
//!   and [`CompressionStrategy`](config::CompressionStrategy). Apply a new
//!   configuration at runtime with
//!   [`ContextWindow::apply_config()`](context::ContextWindow::apply_config).
//! - **Understand what gets evicted and when:** [`context::eviction`].
//! - **Observe the window:** [`metrics`] counters and
//!   [`ContextWindow::usage()`](context::ContextWindow::usage).
//! - **Save and restore windows:** [`persist`] (line-oriented text format
//!   plus a one-way JSON export).
//! - **Share a window across threads:** [`SharedWindow`](sync::SharedWindow).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`context`] | Token accounting, message store, eviction engine, the [`ContextWindow`](context::ContextWindow) aggregate |
//! | [`config`] | Validated window configuration and compression strategies |
//! | [`metrics`] | Optional insertion/eviction/retrieval counters |
//! | [`persist`] | Text save/load codec and JSON export |
//! | [`sync`] | Mutex-guarded window handle for `thread_safe` configurations |

pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod persist;
pub mod prelude;
pub mod sync;

use serde::{Deserialize, Serialize};

pub use error::{Error, Result};

// ── Message types ──────────────────────────────────────────────────

/// Who produced a message in the conversation.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Assistant,
    System,
    Tool,
}

impl MessageKind {
    /// Human-readable label used in the rendered transcript.
    pub fn label(self) -> &'static str {
        match self {
            MessageKind::User => "User",
            MessageKind::Assistant => "Assistant",
            MessageKind::System => "System",
            MessageKind::Tool => "Tool",
        }
    }

    /// Stable integer code used by the text persistence format.
    pub fn code(self) -> u8 {
        match self {
            MessageKind::User => 0,
            MessageKind::Assistant => 1,
            MessageKind::System => 2,
            MessageKind::Tool => 3,
        }
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(MessageKind::User),
            1 => Ok(MessageKind::Assistant),
            2 => Ok(MessageKind::System),
            3 => Ok(MessageKind::Tool),
            other => Err(Error::InvalidParameter(format!("unknown message kind code {other}"))),
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Retention rank of a message. Higher priorities survive compression longer.
///
/// Ordering follows declaration order, so `Low < Normal < High < Critical`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
}

impl Priority {
    /// Stable integer code used by the text persistence format.
    pub fn code(self) -> u8 {
        match self {
            Priority::Low => 0,
            Priority::Normal => 1,
            Priority::High => 2,
            Priority::Critical => 3,
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Priority::Low),
            1 => Ok(Priority::Normal),
            2 => Ok(Priority::High),
            3 => Ok(Priority::Critical),
            other => Err(Error::InvalidParameter(format!("unknown priority code {other}"))),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Normal => write!(f, "normal"),
            Priority::High => write!(f, "high"),
            Priority::Critical => write!(f, "critical"),
        }
    }
}

/// A message held by a [`ContextWindow`](context::ContextWindow).
///
/// The token cost is estimated once when the message enters the window and
/// cached; later ratio changes do not touch it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub priority: Priority,
    pub content: String,
    pub token_count: usize,
}

impl Message {
    pub(crate) fn new(
        kind: MessageKind,
        priority: Priority,
        content: impl Into<String>,
        token_count: usize,
    ) -> Self {
        Self {
            kind,
            priority,
            content: content.into(),
            token_count,
        }
    }

    /// Render as a single transcript line, without the trailing newline.
    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.kind.label(), self.content)
    }
}
