//! Optional usage counters for a context window.
//!
//! A [`Metrics`] record is owned by the window while metrics are enabled.
//! Disabling drops the record and enabling starts a fresh one, so counts never
//! carry across a disable/enable boundary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::Cell;

/// Live metrics record owned by a window.
///
/// Retrieval counting happens on read paths that only borrow the window, so
/// that one counter uses interior mutability.
#[derive(Debug)]
pub struct Metrics {
    messages_added: u64,
    messages_evicted: u64,
    tokens_added: u64,
    tokens_evicted: u64,
    compressions: u64,
    context_retrievals: Cell<u64>,
    peak_utilization: f64,
    start_time: DateTime<Utc>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// A zeroed record starting now.
    pub fn new() -> Self {
        Self {
            messages_added: 0,
            messages_evicted: 0,
            tokens_added: 0,
            tokens_evicted: 0,
            compressions: 0,
            context_retrievals: Cell::new(0),
            peak_utilization: 0.0,
            start_time: Utc::now(),
        }
    }

    pub(crate) fn record_added(&mut self, tokens: usize) {
        self.messages_added += 1;
        self.tokens_added += tokens as u64;
    }

    pub(crate) fn record_evicted(&mut self, tokens: usize) {
        self.messages_evicted += 1;
        self.tokens_evicted += tokens as u64;
    }

    pub(crate) fn record_compression(&mut self) {
        self.compressions += 1;
    }

    pub(crate) fn record_retrieval(&self) {
        self.context_retrievals.set(self.context_retrievals.get() + 1);
    }

    /// Fold the current `total / max` ratio into the running peak.
    pub(crate) fn observe_utilization(&mut self, total_tokens: usize, max_tokens: usize) {
        if max_tokens == 0 {
            return;
        }
        let ratio = total_tokens as f64 / max_tokens as f64;
        if ratio > self.peak_utilization {
            self.peak_utilization = ratio;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_added: self.messages_added,
            messages_evicted: self.messages_evicted,
            tokens_added: self.tokens_added,
            tokens_evicted: self.tokens_evicted,
            compressions: self.compressions,
            context_retrievals: self.context_retrievals.get(),
            peak_utilization: self.peak_utilization,
            start_time: self.start_time,
        }
    }
}

/// Read-only copy of a window's counters.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    /// Successful insertions.
    pub messages_added: u64,
    /// Messages removed by compression or forced eviction.
    pub messages_evicted: u64,
    pub tokens_added: u64,
    pub tokens_evicted: u64,
    /// Compression passes invoked.
    pub compressions: u64,
    /// Transcript and JSON reads.
    pub context_retrievals: u64,
    /// Highest observed `total_tokens / max_tokens` (a fraction, not a percentage).
    pub peak_utilization: f64,
    pub start_time: DateTime<Utc>,
}

impl MetricsSnapshot {
    /// Time elapsed since the record was created or last reset.
    pub fn uptime(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.start_time)
    }

    /// Format as a short log-friendly string.
    pub fn to_log_string(&self) -> String {
        format!(
            "metrics: added={} ({} tokens), evicted={} ({} tokens), compressions={}, retrievals={}, peak={:.1}%",
            self.messages_added,
            self.tokens_added,
            self.messages_evicted,
            self.tokens_evicted,
            self.compressions,
            self.context_retrievals,
            self.peak_utilization * 100.0,
        )
    }
}
