//! Integration tests for the public window API.
//!
//! These exercise full insert/evict/reconfigure/persist flows through the
//! prelude, the way a caller embedding the crate would.

use std::sync::{Arc, Mutex};

use pcc_rs::prelude::*;
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

/// Helper: check the bookkeeping invariants against the stored messages.
fn assert_invariants(window: &ContextWindow) {
    let sum: usize = window.iter().map(|(_, m)| m.token_count).sum();
    assert_eq!(window.token_count(), sum, "total_tokens drifted");
    assert_eq!(window.message_count(), window.iter().count(), "count drifted");
}

/// Helper: content of length `4 * tokens`, so it costs exactly `tokens` at the default ratio.
fn sized(tag: &str, tokens: usize) -> String {
    let mut s = tag.to_string();
    while s.len() < tokens * 4 {
        s.push('.');
    }
    s
}

// ── Log capture ──────────────────────────────────────────────────────

/// A [`Layer`] that records `(level, message)` for every event.
#[derive(Clone, Default)]
struct CaptureLayer(Arc<Mutex<Vec<(tracing::Level, String)>>>);

impl<S: Subscriber + for<'a> LookupSpan<'a>> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        if let Ok(mut events) = self.0.lock() {
            events.push((*event.metadata().level(), visitor.0));
        }
    }
}

#[derive(Default)]
struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

fn capture<T>(f: impl FnOnce() -> T) -> (T, Vec<(tracing::Level, String)>) {
    let layer = CaptureLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    let events = layer.0.lock().unwrap().clone();
    (result, events)
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn critical_message_displaces_all_low_priority_history() {
    let mut window = ContextWindow::new(100).unwrap();
    for i in 0..10 {
        window
            .add_message(MessageKind::User, Priority::Low, sized(&format!("low{i}"), 5))
            .unwrap();
    }
    assert_eq!(window.token_count(), 50);

    window
        .add_message(MessageKind::System, Priority::Critical, sized("critical", 60))
        .unwrap();

    assert_eq!(window.message_count(), 1);
    assert_eq!(window.token_count(), 60);
    assert!(window.context().starts_with("System: critical"));
    assert_invariants(&window);
}

#[test]
fn oversized_message_is_rejected_without_side_effects() {
    let mut window = ContextWindow::new(10).unwrap();
    let err = window
        .add_message(MessageKind::User, Priority::Critical, sized("big", 20))
        .unwrap_err();
    assert!(matches!(err, Error::Full { tokens: 20, max_tokens: 10 }));
    assert_eq!(window.message_count(), 0);
    assert_eq!(window.metrics().unwrap().messages_added, 0);
}

#[test]
fn boundary_capacity() {
    let mut window = ContextWindow::new(25).unwrap();
    window
        .add_message(MessageKind::User, Priority::Low, sized("exact", 25))
        .unwrap();
    assert_eq!(window.token_count(), 25);

    // One over is rejected even with a full window of evictable messages.
    let err = window
        .add_message(MessageKind::User, Priority::Critical, sized("over", 26))
        .unwrap_err();
    assert!(matches!(err, Error::Full { .. }));
    assert_eq!(window.token_count(), 25);
}

#[test]
fn eviction_exhausts_lower_priorities_first() {
    let mut window = ContextWindow::new(40).unwrap();
    window.add_message(MessageKind::System, Priority::Critical, sized("C", 10)).unwrap();
    window.add_message(MessageKind::User, Priority::High, sized("H", 10)).unwrap();
    window.add_message(MessageKind::Assistant, Priority::Normal, sized("N", 10)).unwrap();
    window.add_message(MessageKind::Tool, Priority::Low, sized("L", 10)).unwrap();

    // Needs 10 tokens: only the Low message goes.
    window.add_message(MessageKind::User, Priority::Normal, sized("n2", 10)).unwrap();
    let priorities: Vec<Priority> = window.iter().map(|(_, m)| m.priority).collect();
    assert_eq!(
        priorities,
        vec![Priority::Critical, Priority::High, Priority::Normal, Priority::Normal]
    );

    // Needs 20 tokens: both Normal messages go, High and Critical stay.
    window.add_message(MessageKind::User, Priority::High, sized("h2", 20)).unwrap();
    let priorities: Vec<Priority> = window.iter().map(|(_, m)| m.priority).collect();
    assert_eq!(
        priorities,
        vec![Priority::Critical, Priority::High, Priority::High]
    );
    assert_invariants(&window);
}

#[test]
fn forced_eviction_of_critical_is_logged_as_warning() {
    let mut window = ContextWindow::new(20).unwrap();
    window
        .add_message(MessageKind::System, Priority::Critical, sized("sys", 15))
        .unwrap();

    let (result, events) = capture(|| {
        window.add_message(MessageKind::User, Priority::Critical, sized("user", 10))
    });
    result.unwrap();

    assert_eq!(window.message_count(), 1);
    assert!(window.context().starts_with("User: user"));
    assert!(
        events
            .iter()
            .any(|(level, msg)| *level == tracing::Level::WARN && msg.contains("Forced eviction")),
        "expected a WARN forced-eviction event, got {events:?}"
    );
}

#[test]
fn budget_invariant_holds_across_mixed_workload() {
    let mut window = ContextWindow::new(300).unwrap();
    for i in 0..500 {
        let priority = match i % 4 {
            0 => Priority::Low,
            1 => Priority::Normal,
            2 => Priority::High,
            _ => Priority::Critical,
        };
        let content = format!("Stress message number {i} with some additional text");
        window
            .add_message(MessageKind::User, priority, content)
            .unwrap();
        assert!(window.token_count() <= window.max_tokens());
        if i % 7 == 0 {
            let _ = window.remove_message("Stress message number 3 with some additional text");
        }
        assert_invariants(&window);
    }
}

#[test]
fn shrinking_budget_reevicts_immediately() {
    let mut window = ContextWindow::new(1000).unwrap();
    for i in 0..5 {
        window
            .add_message(MessageKind::User, Priority::Normal, sized(&format!("m{i}"), 20))
            .unwrap();
    }
    assert_eq!(window.token_count(), 100);

    let config = WindowConfig::new(50).with_compression(CompressionStrategy::None);
    window.apply_config(config).unwrap();

    assert!(window.token_count() <= 50);
    assert_eq!(window.message_count(), 2);
    assert!(window.context().starts_with("User: m3"));
    assert_invariants(&window);
}

#[test]
fn growing_budget_keeps_messages() {
    let mut window = ContextWindow::new(50).unwrap();
    window.add_message(MessageKind::User, Priority::Low, sized("a", 30)).unwrap();
    window.apply_config(WindowConfig::new(5000)).unwrap();
    assert_eq!(window.message_count(), 1);
    assert_eq!(window.remaining_capacity(), 4970);
}

#[test]
fn save_load_roundtrip_reproduces_window() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("context_save.txt");

    let mut window = ContextWindow::new(2000).unwrap();
    window
        .add_message(
            MessageKind::System,
            Priority::Critical,
            "You are a helpful AI assistant specializing in C programming.",
        )
        .unwrap();
    window
        .add_message(MessageKind::User, Priority::High, "How do I allocate memory in C?")
        .unwrap();
    window
        .add_message(
            MessageKind::Assistant,
            Priority::Normal,
            "malloc() allocates uninitialized memory, calloc() zeros it.",
        )
        .unwrap();
    window
        .add_message(MessageKind::Tool, Priority::Low, "\ttabs and trailing spaces  ")
        .unwrap();
    window.save(&path).unwrap();

    let loaded = ContextWindow::load(&path).unwrap();
    assert_eq!(loaded.max_tokens(), 2000);
    assert_eq!(loaded.message_count(), window.message_count());
    assert_eq!(loaded.token_count(), window.token_count());

    let expected: Vec<(MessageKind, Priority, &str)> = window
        .iter()
        .map(|(_, m)| (m.kind, m.priority, m.content.as_str()))
        .collect();
    let actual: Vec<(MessageKind, Priority, &str)> = loaded
        .iter()
        .map(|(_, m)| (m.kind, m.priority, m.content.as_str()))
        .collect();
    assert_eq!(expected, actual);
}

#[test]
fn loaded_window_resumes_normal_eviction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ctx.txt");

    let mut window = ContextWindow::new(20).unwrap();
    window.add_message(MessageKind::User, Priority::Low, sized("old", 10)).unwrap();
    window.add_message(MessageKind::System, Priority::Critical, sized("sys", 10)).unwrap();
    window.save(&path).unwrap();

    let mut loaded = ContextWindow::load(&path).unwrap();
    loaded
        .add_message(MessageKind::User, Priority::Normal, sized("new", 10))
        .unwrap();
    assert_eq!(loaded.context().lines().count(), 2);
    assert!(!loaded.context().contains("old"));
}

#[test]
fn transcript_reads_are_idempotent_copies() {
    let mut window = ContextWindow::new(100).unwrap();
    window.add_message(MessageKind::User, Priority::Normal, "Message 1").unwrap();
    window.add_message(MessageKind::Assistant, Priority::Normal, "Response 1").unwrap();

    let first = window.context();
    let second = window.context();
    assert_eq!(first, second);
    assert_eq!(first, "User: Message 1\nAssistant: Response 1\n");
    assert_eq!(window.metrics().unwrap().context_retrievals, 2);

    let json_a = window.to_json().unwrap();
    let json_b = window.to_json().unwrap();
    assert_eq!(json_a, json_b);
}

#[test]
fn read_accessors_report_usage() {
    let mut window = ContextWindow::new(200).unwrap();
    window.add_message(MessageKind::User, Priority::Normal, sized("u", 50)).unwrap();

    assert_eq!(window.remaining_capacity(), 150);
    assert!((window.utilization() - 25.0).abs() < 1e-9);
    assert!(!window.is_full());
    assert!(!window.is_empty());

    let usage = window.usage();
    assert_eq!(usage.total_tokens, 50);
    assert_eq!(usage.remaining(), 150);
}

#[test]
fn many_small_messages_fill_without_overflow() {
    let mut window = ContextWindow::new(500).unwrap();
    let mut count = 0;
    while window.token_count() < 450 {
        window
            .add_message(MessageKind::User, Priority::Normal, format!("Msg{count}"))
            .unwrap();
        count += 1;
    }
    assert!(count > 10);
    assert!(window.token_count() <= 500);
}

#[test]
fn metrics_toggle_is_independent_of_messages() {
    let config = WindowConfig::default().with_metrics(false);
    let mut window = ContextWindow::with_config(config).unwrap();
    window.add_message(MessageKind::User, Priority::Normal, "hello").unwrap();
    assert!(window.metrics().is_none());

    window.set_metrics_enabled(true);
    window.add_message(MessageKind::User, Priority::Normal, "again").unwrap();
    let snapshot = window.metrics().unwrap();
    assert_eq!(snapshot.messages_added, 1);
    assert_eq!(window.message_count(), 2);
}

#[test]
fn shared_window_rejects_when_busy() {
    let config = WindowConfig::new(100).with_thread_safe(true);
    let shared = SharedWindow::new(ContextWindow::with_config(config).unwrap()).unwrap();
    let other = shared.clone();

    shared.with_mut(|w| {
        w.add_message(MessageKind::User, Priority::Normal, "held").unwrap();
        assert!(matches!(other.try_with_mut(|w| w.clear()), Err(Error::Locked)));
    });
    assert_eq!(shared.with(|w| w.message_count()), 1);
}
