//! Configuration for a [`ContextWindow`](crate::context::ContextWindow).
//!
//! Defaults are tuned for small local models; override individual settings
//! with the `with_*()` builder methods or struct update syntax.
//!
//! # Examples
//!
//! Default configuration:
//!
//! ```
//! use pcc_rs::config::WindowConfig;
//!
//! let config = WindowConfig::default();
//! assert_eq!(config.max_tokens, 2048);
//! assert!(config.validate().is_ok());
//! ```
//!
//! Customized configuration:
//!
//! ```
//! use pcc_rs::config::{CompressionStrategy, WindowConfig};
//!
//! let config = WindowConfig::new(500)
//!     .with_compression(CompressionStrategy::Aggressive)
//!     .with_min_tokens_reserve(50)
//!     .with_token_ratio(3);
//! assert!(config.validate().is_ok());
//! ```

use crate::context::DEFAULT_CHARS_PER_TOKEN;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default window capacity in tokens.
pub const DEFAULT_MAX_TOKENS: usize = 2048;

/// Largest accepted `max_tokens`. Half the signed 32-bit range leaves
/// headroom for `total + incoming` sums.
pub const MAX_TOKENS_CEILING: usize = (i32::MAX / 2) as usize;

/// How the window makes room before falling back to forced eviction.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompressionStrategy {
    /// Never compress; overflow goes straight to forced eviction.
    None,
    /// Drop `Low`, then `Normal`, then `High` messages until the new message fits.
    #[default]
    LowPriorityFirst,
    /// Reserved for model-based summarization. Currently compresses like
    /// [`LowPriorityFirst`](Self::LowPriorityFirst).
    Summarize,
    /// Like `LowPriorityFirst`, but compresses until `min_tokens_reserve`
    /// tokens are also left free.
    Aggressive,
}

/// Operating parameters of a context window.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WindowConfig {
    /// Token capacity of the window.
    pub max_tokens: usize,
    /// Tokens [`CompressionStrategy::Aggressive`] keeps free after an insertion.
    pub min_tokens_reserve: usize,
    pub compression: CompressionStrategy,
    /// Whether the window keeps a metrics record.
    pub metrics_enabled: bool,
    /// Whether the window is meant to be shared across threads through
    /// [`SharedWindow`](crate::sync::SharedWindow).
    pub thread_safe: bool,
    /// Characters per token used when estimating new messages.
    pub token_ratio: usize,
    /// Whether overflow runs staged compression before forced eviction.
    pub auto_compress: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            min_tokens_reserve: 0,
            compression: CompressionStrategy::default(),
            metrics_enabled: true,
            thread_safe: false,
            token_ratio: DEFAULT_CHARS_PER_TOKEN,
            auto_compress: true,
        }
    }
}

impl WindowConfig {
    /// Default configuration with a custom token limit.
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            ..Self::default()
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_min_tokens_reserve(mut self, reserve: usize) -> Self {
        self.min_tokens_reserve = reserve;
        self
    }

    pub fn with_compression(mut self, strategy: CompressionStrategy) -> Self {
        self.compression = strategy;
        self
    }

    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    pub fn with_thread_safe(mut self, thread_safe: bool) -> Self {
        self.thread_safe = thread_safe;
        self
    }

    pub fn with_token_ratio(mut self, ratio: usize) -> Self {
        self.token_ratio = ratio;
        self
    }

    pub fn with_auto_compress(mut self, enabled: bool) -> Self {
        self.auto_compress = enabled;
        self
    }

    /// Check every parameter, reporting the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 || self.max_tokens > MAX_TOKENS_CEILING {
            return Err(Error::InvalidParameter(format!(
                "max_tokens must be within 1..={MAX_TOKENS_CEILING}, got {}",
                self.max_tokens
            )));
        }
        if self.token_ratio == 0 {
            return Err(Error::InvalidParameter("token_ratio must be positive".into()));
        }
        if self.min_tokens_reserve >= self.max_tokens {
            return Err(Error::InvalidParameter(format!(
                "min_tokens_reserve ({}) must be less than max_tokens ({})",
                self.min_tokens_reserve, self.max_tokens
            )));
        }
        Ok(())
    }

    /// Whether overflow should run staged compression at all.
    pub(crate) fn compresses(&self) -> bool {
        self.auto_compress && self.compression != CompressionStrategy::None
    }
}
