use std::io::Write;
use std::sync::{Arc, Mutex};

use log::warn;

/// Destination for per-example diagnostic text such as raw predictions.
pub trait TextSink {
    /// Emits one line. `channel` identifies the output stream the line was
    /// requested for; `tag` is the example's tag, appended when non-empty.
    fn print_text(&mut self, channel: i32, text: &str, tag: &str);
}

/// Writes `"<text> <tag>\n"` lines to any `Write`.
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> WriterSink<W> {
        WriterSink { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TextSink for WriterSink<W> {
    fn print_text(&mut self, channel: i32, text: &str, tag: &str) {
        let res = if tag.is_empty() {
            writeln!(self.writer, "{text}")
        } else {
            writeln!(self.writer, "{text} {tag}")
        };
        if let Err(e) = res {
            warn!("write to text channel {channel} failed: {e}");
        }
    }
}

/// Collects lines in memory. Clones share the same buffer, so one clone can
/// be handed to a context while another is kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> MemorySink {
        MemorySink::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl TextSink for MemorySink {
    fn print_text(&mut self, _channel: i32, text: &str, tag: &str) {
        let line = if tag.is_empty() { text.to_string() } else { format!("{text} {tag}") };
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}
