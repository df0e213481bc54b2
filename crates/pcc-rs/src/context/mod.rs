//! Context window management: token accounting, storage, and eviction.
//!
//! The context window is the scarcest resource of a small-model deployment.
//! This module keeps it bounded in layers:
//!
//! 1. **[`budget`]**: estimates message cost from character length
//!    (`ceil(chars / ratio)`) and reports utilization.
//!
//! 2. **[`store`]**: arena-backed ordered storage with handles that go stale
//!    on removal, keeping `total_tokens` and the message count in lock-step.
//!
//! 3. **[`eviction`]**: staged priority compression (`Low`, then `Normal`,
//!    then `High`) followed by last-resort forced eviction from the oldest end.
//!
//! 4. **[`window`]**: the [`ContextWindow`] aggregate tying the above to a
//!    validated [`WindowConfig`](crate::config::WindowConfig) and optional
//!    metrics, and rendering the transcript.

pub mod budget;
pub mod eviction;
pub mod store;
pub mod window;

// Re-export commonly used items at the module level.
pub use budget::{ContextUsage, DEFAULT_CHARS_PER_TOKEN, estimate_tokens, utilization_pct};
pub use eviction::EvictionOutcome;
pub use store::MessageId;
pub use window::ContextWindow;
