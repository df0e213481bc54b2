//! Eviction policy: make room for an incoming message by compressing in
//! priority order, then by forcibly evicting the oldest messages.
//!
//! Two mechanisms run in strict order:
//!
//! 1. **Staged compression** (only when `auto_compress` is on and the
//!    strategy is not [`CompressionStrategy::None`]). Stage A removes every
//!    `Low` message, stage B every `Normal`, stage C every `High`. Each stage
//!    collects its victims oldest-first and removes them in a second pass.
//!    The budget is re-checked between stages and compression stops as soon
//!    as the incoming message fits. `Critical` messages are never compressed.
//!
//! 2. **Forced eviction.** If the message still does not fit, messages are
//!    dropped from the oldest end regardless of priority, `Critical`
//!    included, until it fits or the store is empty. This is the only path
//!    that can lose a `Critical` message and it is logged at `WARN`.

use super::store::MessageStore;
use crate::config::{CompressionStrategy, WindowConfig};
use crate::{Message, Priority};
use tracing::{debug, warn};

/// Compression stages in the order they run. `Critical` is never compressed.
pub const COMPRESSION_STAGES: [Priority; 3] = [Priority::Low, Priority::Normal, Priority::High];

/// What a [`make_room`] call removed.
#[derive(Debug, Default)]
pub struct EvictionOutcome {
    /// Whether staged compression was invoked.
    pub compression_ran: bool,
    /// Priorities whose stage actually executed, in order.
    pub stages_run: Vec<Priority>,
    /// Messages removed by staged compression, oldest first within each stage.
    pub compressed: Vec<Message>,
    /// Messages removed by forced eviction, oldest first.
    pub forced: Vec<Message>,
}

impl EvictionOutcome {
    /// Every removed message, compression victims first.
    pub fn evicted(&self) -> impl Iterator<Item = &Message> {
        self.compressed.iter().chain(self.forced.iter())
    }

    pub fn messages_evicted(&self) -> usize {
        self.compressed.len() + self.forced.len()
    }

    pub fn tokens_evicted(&self) -> usize {
        self.evicted().map(|m| m.token_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        !self.compression_ran && self.compressed.is_empty() && self.forced.is_empty()
    }
}

/// Remove messages from `store` until `incoming` more tokens fit in
/// `config.max_tokens`.
///
/// Pass `incoming = 0` to restore the budget after the capacity shrank.
/// Does nothing when the budget already holds.
pub fn make_room(
    store: &mut MessageStore,
    incoming: usize,
    config: &WindowConfig,
) -> EvictionOutcome {
    let mut outcome = EvictionOutcome::default();
    let max = config.max_tokens;

    if fits(store, incoming, max) {
        return outcome;
    }

    if config.compresses() {
        compress(store, incoming, config, &mut outcome);
    }

    if !fits(store, incoming, max) {
        force_evict(store, incoming, max, &mut outcome);
    }

    outcome
}

fn fits(store: &MessageStore, incoming: usize, limit: usize) -> bool {
    store.total_tokens().saturating_add(incoming) <= limit
}

/// Budget that staged compression aims for under `config`.
fn compression_target(config: &WindowConfig) -> usize {
    match config.compression {
        CompressionStrategy::Aggressive => {
            config.max_tokens.saturating_sub(config.min_tokens_reserve)
        }
        _ => config.max_tokens,
    }
}

fn compress(
    store: &mut MessageStore,
    incoming: usize,
    config: &WindowConfig,
    outcome: &mut EvictionOutcome,
) {
    if config.compression == CompressionStrategy::Summarize {
        debug!("Summarize compression is not available; compressing by priority");
    }

    outcome.compression_ran = true;
    let target = compression_target(config);

    for stage in COMPRESSION_STAGES {
        if fits(store, incoming, target) {
            break;
        }
        let victims = store.collect_ids(|m| m.priority == stage);
        let removed = store.remove_many(&victims);
        let freed: usize = removed.iter().map(|m| m.token_count).sum();
        debug!(
            "Compression stage {}: removed {} message(s), {} tokens (now {}/{})",
            stage,
            removed.len(),
            freed,
            store.total_tokens(),
            config.max_tokens,
        );
        outcome.stages_run.push(stage);
        outcome.compressed.extend(removed);
    }
}

fn force_evict(
    store: &mut MessageStore,
    incoming: usize,
    max: usize,
    outcome: &mut EvictionOutcome,
) {
    let before = outcome.forced.len();
    while !fits(store, incoming, max) {
        let Some(message) = store.pop_oldest() else {
            break;
        };
        debug!(
            "Forced eviction: dropped {} {} message ({} tokens)",
            message.priority, message.kind, message.token_count,
        );
        outcome.forced.push(message);
    }

    let dropped = &outcome.forced[before..];
    let critical = dropped
        .iter()
        .filter(|m| m.priority == Priority::Critical)
        .count();
    warn!(
        "Forced eviction removed {} message(s) ({} critical, {} tokens) \
         to fit {} incoming tokens in {}",
        dropped.len(),
        critical,
        dropped.iter().map(|m| m.token_count).sum::<usize>(),
        incoming,
        max,
    );
}
