//! Line-oriented text format for saving and restoring a window.
//!
//! ```text
//! PCC_CONTEXT_V1
//! <max_tokens>
//! <message_count>
//! <kind code>          ┐
//! <priority code>      │ once per message, oldest first
//! <token_count>        │
//! <content>            ┘
//! ```
//!
//! Content is written as a single raw line; embedded line breaks are not
//! escaped, so a file holding a multi-line message fails to load with
//! `InvalidData` (the extra lines are left over after the declared messages).
//!
//! Loading restores messages verbatim with their stored token counts and does
//! not run eviction, so a file whose messages exceed its declared budget loads
//! over capacity.

use crate::config::MAX_TOKENS_CEILING;
use crate::context::ContextWindow;
use crate::error::{Error, Result};
use crate::{Message, MessageKind, Priority};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Header line identifying the format version.
pub const FORMAT_HEADER: &str = "PCC_CONTEXT_V1";

/// Serialize `window` to `out`.
pub fn write_text<W: Write>(window: &ContextWindow, mut out: W) -> Result<()> {
    writeln!(out, "{FORMAT_HEADER}")?;
    writeln!(out, "{}", window.max_tokens())?;
    writeln!(out, "{}", window.message_count())?;
    for (_, message) in window.iter() {
        writeln!(out, "{}", message.kind.code())?;
        writeln!(out, "{}", message.priority.code())?;
        writeln!(out, "{}", message.token_count)?;
        writeln!(out, "{}", message.content)?;
    }
    out.flush()?;
    Ok(())
}

/// Rebuild a window from text produced by [`write_text`].
pub fn read_text<R: BufRead>(input: R) -> Result<ContextWindow> {
    let mut lines = LineReader::new(input);

    let header = lines.next_line("header")?;
    if header != FORMAT_HEADER {
        return Err(invalid_data(format!(
            "unrecognized header {header:?}, expected {FORMAT_HEADER}"
        )));
    }

    let max_tokens: usize = lines.next_number("max_tokens")?;
    let count: usize = lines.next_number("message_count")?;

    let mut window = ContextWindow::new(max_tokens)?;
    let mut total: usize = 0;
    for index in 0..count {
        let kind = MessageKind::try_from(lines.next_number::<u8>("kind")?)
            .map_err(|e| invalid_data(format!("message {index}: {e}")))?;
        let priority = Priority::try_from(lines.next_number::<u8>("priority")?)
            .map_err(|e| invalid_data(format!("message {index}: {e}")))?;
        let token_count: usize = lines.next_number("token_count")?;
        if token_count > MAX_TOKENS_CEILING {
            return Err(invalid_data(format!(
                "message {index}: token_count {token_count} exceeds {MAX_TOKENS_CEILING}"
            )));
        }
        total = total
            .checked_add(token_count)
            .ok_or_else(|| invalid_data(format!("message {index}: total token count overflows")))?;
        let content = lines.next_line("content")?;
        window.push_unchecked(Message::new(kind, priority, content, token_count))?;
    }

    if !lines.at_end()? {
        return Err(invalid_data(format!(
            "line {}: trailing data after {count} message(s)",
            lines.line_no + 1
        )));
    }

    if window.token_count() > window.max_tokens() {
        warn!(
            "Loaded window is over budget: {} tokens in a {}-token window",
            window.token_count(),
            window.max_tokens(),
        );
    }
    Ok(window)
}

impl ContextWindow {
    /// Write the window to `path` in the text format, overwriting the file.
    ///
    /// Not transactional: a failure part-way leaves a partially written file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        write_text(self, BufWriter::new(file))?;
        debug!(
            "Saved {} message(s) ({} tokens) to {}",
            self.message_count(),
            self.token_count(),
            path.display(),
        );
        Ok(())
    }

    /// Load a window previously written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let window = read_text(BufReader::new(file))?;
        debug!(
            "Loaded {} message(s) ({} tokens) from {}",
            window.message_count(),
            window.token_count(),
            path.display(),
        );
        Ok(window)
    }
}

fn invalid_data(msg: String) -> Error {
    Error::Io(io::Error::new(io::ErrorKind::InvalidData, msg))
}

/// Reads lines while keeping everything but the `\n` terminator, so content
/// with trailing whitespace or `\r` round-trips byte-for-byte.
struct LineReader<R> {
    inner: R,
    line_no: usize,
}

impl<R: BufRead> LineReader<R> {
    fn new(inner: R) -> Self {
        Self { inner, line_no: 0 }
    }

    fn next_line(&mut self, field: &str) -> Result<String> {
        let mut buf = String::new();
        let read = self.inner.read_line(&mut buf)?;
        self.line_no += 1;
        if read == 0 {
            return Err(invalid_data(format!(
                "unexpected end of file at line {} (expected {field})",
                self.line_no
            )));
        }
        if buf.ends_with('\n') {
            buf.pop();
        }
        Ok(buf)
    }

    fn at_end(&mut self) -> Result<bool> {
        Ok(self.inner.fill_buf()?.is_empty())
    }

    fn next_number<T: std::str::FromStr>(&mut self, field: &str) -> Result<T> {
        let line = self.next_line(field)?;
        line.trim().parse().map_err(|_| {
            invalid_data(format!(
                "line {}: expected {field} as an integer, got {line:?}",
                self.line_no
            ))
        })
    }
}
