//! Token accounting: estimates the cost of a text blob and summarizes how
//! much of a window's budget is in use.
//!
//! The estimate is a character-count heuristic, not a real tokenizer: a
//! message of `n` characters costs `ceil(n / ratio)` tokens. It is computed
//! once per message when it enters the window and cached on the
//! [`Message`](crate::Message).

/// Default characters per token (conservative estimate for English text).
pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

/// Estimate the token cost of `text` at `chars_per_token` characters per token.
///
/// Rounds up, so any non-empty text costs at least one token. Empty text
/// costs nothing. The ratio is validated by
/// [`WindowConfig::validate()`](crate::config::WindowConfig::validate), not
/// here; a zero ratio yields 0 instead of panicking.
///
/// ```
/// use pcc_rs::context::estimate_tokens;
///
/// assert_eq!(estimate_tokens("", 4), 0);
/// assert_eq!(estimate_tokens("a", 4), 1);
/// assert_eq!(estimate_tokens("abcd", 4), 1);
/// assert_eq!(estimate_tokens("abcde", 4), 2);
/// ```
pub fn estimate_tokens(text: &str, chars_per_token: usize) -> usize {
    if text.is_empty() || chars_per_token == 0 {
        return 0;
    }
    text.chars().count().div_ceil(chars_per_token)
}

/// `total / max` as a percentage. A zero-sized budget reports 0%.
pub fn utilization_pct(total_tokens: usize, max_tokens: usize) -> f64 {
    if max_tokens == 0 {
        return 0.0;
    }
    100.0 * total_tokens as f64 / max_tokens as f64
}

/// Snapshot of a window's budget usage at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextUsage {
    /// Tokens currently held.
    pub total_tokens: usize,
    /// Window capacity.
    pub max_tokens: usize,
    /// Usage as a percentage (0.0 to 100.0, above 100 only for over-budget loads).
    pub usage_pct: f64,
}

impl ContextUsage {
    pub fn new(total_tokens: usize, max_tokens: usize) -> Self {
        Self {
            total_tokens,
            max_tokens,
            usage_pct: utilization_pct(total_tokens, max_tokens),
        }
    }

    /// Tokens still available before the budget is reached.
    pub fn remaining(&self) -> usize {
        self.max_tokens.saturating_sub(self.total_tokens)
    }

    /// Format as a short log-friendly string.
    pub fn to_log_string(&self) -> String {
        format!(
            "context: {} tokens ({:.1}% of {}, {} remaining)",
            self.total_tokens,
            self.usage_pct,
            self.max_tokens,
            self.remaining(),
        )
    }
}
