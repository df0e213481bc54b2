//! One-way JSON export of a window. There is no corresponding import.

use crate::context::ContextWindow;
use crate::error::Result;
use crate::{MessageKind, Priority};
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Window-level metadata plus one record per message, oldest first.
#[derive(Serialize, Debug)]
pub struct JsonExport<'a> {
    pub max_tokens: usize,
    pub total_tokens: usize,
    pub message_count: usize,
    pub messages: Vec<JsonMessage<'a>>,
}

#[derive(Serialize, Debug)]
pub struct JsonMessage<'a> {
    pub kind: MessageKind,
    pub priority: Priority,
    pub content: &'a str,
    pub tokens: usize,
}

impl<'a> JsonExport<'a> {
    pub fn from_window(window: &'a ContextWindow) -> Self {
        Self {
            max_tokens: window.max_tokens(),
            total_tokens: window.token_count(),
            message_count: window.message_count(),
            messages: window
                .iter()
                .map(|(_, m)| JsonMessage {
                    kind: m.kind,
                    priority: m.priority,
                    content: &m.content,
                    tokens: m.token_count,
                })
                .collect(),
        }
    }
}

impl ContextWindow {
    /// Render the window as pretty-printed JSON. Counts as a retrieval.
    pub fn to_json(&self) -> Result<String> {
        self.record_retrieval();
        let json = serde_json::to_string_pretty(&JsonExport::from_window(self))
            .map_err(std::io::Error::from)?;
        Ok(json)
    }

    /// Write [`to_json()`](Self::to_json) output to `path`, overwriting it.
    pub fn export_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        debug!(
            "Exported {} message(s) as JSON to {}",
            self.message_count(),
            path.display()
        );
        Ok(())
    }
}
