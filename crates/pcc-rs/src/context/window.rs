//! The [`ContextWindow`] aggregate: a budgeted, priority-aware message store.

use super::budget::{ContextUsage, estimate_tokens, utilization_pct};
use super::eviction::{self, EvictionOutcome};
use super::store::{MessageId, MessageStore};
use crate::config::WindowConfig;
use crate::error::{Error, Result};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::{Message, MessageKind, Priority};
use tracing::{debug, info};

/// An ordered conversation bounded by a token budget.
///
/// Insertion never leaves the window over budget: when a new message does not
/// fit, the window compresses lower-priority messages and, as a last resort,
/// evicts the oldest ones (see [`eviction`](super::eviction)). The only
/// refusal is a message that would not fit even in an empty window.
///
/// # Example
///
/// ```
/// use pcc_rs::prelude::*;
///
/// let mut window = ContextWindow::new(100)?;
/// for i in 0..10 {
///     // 20 characters -> 5 tokens each.
///     window.add_message(MessageKind::User, Priority::Low, format!("low priority msg {i:03}"))?;
/// }
/// window.add_message(MessageKind::System, Priority::Critical, "x".repeat(240))?;
///
/// assert_eq!(window.message_count(), 1);
/// assert_eq!(window.token_count(), 60);
/// # Ok::<(), pcc_rs::Error>(())
/// ```
#[derive(Debug)]
pub struct ContextWindow {
    store: MessageStore,
    config: WindowConfig,
    metrics: Option<Metrics>,
}

impl ContextWindow {
    /// Create a window with the default configuration and a custom token limit.
    pub fn new(max_tokens: usize) -> Result<Self> {
        Self::with_config(WindowConfig::new(max_tokens))
    }

    /// Create a window from a full configuration, validating it first.
    pub fn with_config(config: WindowConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            "Created context window: max_tokens={}, compression={:?}, ratio={}",
            config.max_tokens, config.compression, config.token_ratio,
        );
        let metrics = config.metrics_enabled.then(Metrics::new);
        Ok(Self {
            store: MessageStore::new(),
            config,
            metrics,
        })
    }

    // ── Mutation ───────────────────────────────────────────────────

    /// Insert a message at the newest end, making room if necessary.
    ///
    /// Returns [`Error::Full`] (leaving the window untouched) only when the
    /// message alone exceeds `max_tokens`.
    pub fn add_message(
        &mut self,
        kind: MessageKind,
        priority: Priority,
        content: impl Into<String>,
    ) -> Result<MessageId> {
        let content = content.into();
        let tokens = estimate_tokens(&content, self.config.token_ratio);
        let max_tokens = self.config.max_tokens;

        if tokens > max_tokens {
            debug!(
                "Rejected {} message: {} tokens exceeds capacity {}",
                kind, tokens, max_tokens
            );
            return Err(Error::Full { tokens, max_tokens });
        }

        let outcome = eviction::make_room(&mut self.store, tokens, &self.config);
        self.record_eviction(&outcome);

        let id = self
            .store
            .push(Message::new(kind, priority, content, tokens))?;

        if let Some(metrics) = self.metrics.as_mut() {
            metrics.record_added(tokens);
            metrics.observe_utilization(self.store.total_tokens(), max_tokens);
        }
        Ok(id)
    }

    /// Remove the first (oldest) message whose content equals `content`.
    pub fn remove_message(&mut self, content: &str) -> Result<Message> {
        let id = self
            .store
            .find(|m| m.content == content)
            .ok_or(Error::NotFound)?;
        self.remove(id)
    }

    /// Remove a message by handle.
    pub fn remove(&mut self, id: MessageId) -> Result<Message> {
        self.store.remove(id).ok_or(Error::NullOrMissingHandle)
    }

    /// Drop every message. Configuration and metrics are kept.
    pub fn clear(&mut self) {
        debug!("Clearing context window ({} messages)", self.store.len());
        self.store.clear();
    }

    // ── Configuration ──────────────────────────────────────────────

    /// The active configuration.
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Replace the active configuration.
    ///
    /// An invalid configuration is rejected with no change. When the new
    /// `max_tokens` is smaller, compression and forced eviction re-run until
    /// the window fits the new budget. Cached token counts are not
    /// re-estimated under a changed `token_ratio`.
    pub fn apply_config(&mut self, config: WindowConfig) -> Result<()> {
        config.validate()?;

        let shrunk = config.max_tokens < self.config.max_tokens;
        let metrics_toggled = config.metrics_enabled != self.config.metrics_enabled;
        self.config = config;

        if metrics_toggled {
            self.set_metrics_enabled(self.config.metrics_enabled);
        }

        if shrunk {
            let outcome = eviction::make_room(&mut self.store, 0, &self.config);
            info!(
                "Budget reduced to {} tokens: evicted {} message(s), {} tokens",
                self.config.max_tokens,
                outcome.messages_evicted(),
                outcome.tokens_evicted(),
            );
            self.record_eviction(&outcome);
        }
        Ok(())
    }

    // ── Metrics ────────────────────────────────────────────────────

    /// Snapshot of the counters, or `None` while metrics are disabled.
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.metrics.as_ref().map(Metrics::snapshot)
    }

    /// Zero every counter and restart the clock. No-op while disabled.
    pub fn reset_metrics(&mut self) {
        if let Some(metrics) = self.metrics.as_mut() {
            *metrics = Metrics::new();
        }
    }

    /// Enable (with a fresh record) or disable (dropping the record) metrics.
    pub fn set_metrics_enabled(&mut self, enabled: bool) {
        self.config.metrics_enabled = enabled;
        match (enabled, self.metrics.is_some()) {
            (true, false) => self.metrics = Some(Metrics::new()),
            (false, true) => self.metrics = None,
            _ => {}
        }
    }

    // ── Reads ──────────────────────────────────────────────────────

    /// Render the transcript: one `"<Kind>: <content>"` line per message,
    /// oldest first, each terminated by `\n`. An empty window renders as `""`.
    pub fn context(&self) -> String {
        self.record_retrieval();
        let mut out = String::new();
        for (_, message) in self.store.iter() {
            out.push_str(&message.transcript_line());
            out.push('\n');
        }
        out
    }

    pub fn message_count(&self) -> usize {
        self.store.len()
    }

    pub fn token_count(&self) -> usize {
        self.store.total_tokens()
    }

    pub fn max_tokens(&self) -> usize {
        self.config.max_tokens
    }

    /// Tokens left before the budget is reached (0 for over-budget loads).
    pub fn remaining_capacity(&self) -> usize {
        self.config.max_tokens.saturating_sub(self.store.total_tokens())
    }

    /// Utilization as a percentage of `max_tokens`.
    pub fn utilization(&self) -> f64 {
        utilization_pct(self.store.total_tokens(), self.config.max_tokens)
    }

    pub fn usage(&self) -> ContextUsage {
        ContextUsage::new(self.store.total_tokens(), self.config.max_tokens)
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.store.total_tokens() >= self.config.max_tokens
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.store.get(id)
    }

    /// Iterate messages from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = (MessageId, &Message)> + '_ {
        self.store.iter()
    }

    // ── Internals ──────────────────────────────────────────────────

    /// Append a message verbatim, bypassing estimation and eviction.
    pub(crate) fn push_unchecked(&mut self, message: Message) -> Result<MessageId> {
        self.store.push(message)
    }

    pub(crate) fn record_retrieval(&self) {
        if let Some(metrics) = self.metrics.as_ref() {
            metrics.record_retrieval();
        }
    }

    fn record_eviction(&mut self, outcome: &EvictionOutcome) {
        let Some(metrics) = self.metrics.as_mut() else {
            return;
        };
        if outcome.compression_ran {
            metrics.record_compression();
        }
        for message in outcome.evicted() {
            metrics.record_evicted(message.token_count);
        }
    }
}
