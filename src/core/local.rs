//! Local stream writer
//!
//! Every facade call produces one human-readable line here. Facades derived
//! from the same root share one writer; each line is written under a single
//! lock so concurrent callers never interleave within a line.

use super::error::Result;
use super::log_entry::Labels;
use super::timestamp::TimestampFormat;
use chrono::Local;
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

#[derive(Clone)]
pub struct LocalWriter {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
    prefix: Arc<str>,
    timestamp_format: TimestampFormat,
}

impl LocalWriter {
    /// Writer targeting the process's stderr
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
            prefix: Arc::from(""),
            timestamp_format: TimestampFormat::default(),
        }
    }

    /// Set the text written before the timestamp of every line
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Arc::from(prefix.into());
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn timestamp_format(&self) -> &TimestampFormat {
        &self.timestamp_format
    }

    /// Build the line for a message, without the trailing newline
    pub fn format_line(&self, message: &str) -> String {
        let message = sanitize_message(message);
        match self.timestamp_format.format(&Local::now()) {
            Some(ts) => format!("{}{} {}", self.prefix, ts, message),
            None => format!("{}{}", self.prefix, message),
        }
    }

    /// Write one line; failures are reported on stderr and otherwise ignored
    pub fn write_line(&self, message: &str) {
        let mut line = self.format_line(message);
        line.push('\n');

        let mut out = self.out.lock();
        if let Err(e) = out.write_all(line.as_bytes()) {
            eprintln!("[LOGGER ERROR] Local stream write failed: {}", e);
        }
    }

    pub fn flush(&self) -> Result<()> {
        self.out.lock().flush()?;
        Ok(())
    }
}

impl fmt::Debug for LocalWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalWriter")
            .field("prefix", &self.prefix)
            .field("timestamp_format", &self.timestamp_format)
            .finish_non_exhaustive()
    }
}

/// Line prefix derived from the `app` and `module` common labels
///
/// `app` and `module` are space-joined, trimmed and followed by one space, so
/// blank or absent labels leave a single-space prefix.
pub fn prefix_from_labels(labels: &Labels) -> String {
    let app = labels.get("app").map(String::as_str).unwrap_or("");
    let module = labels.get("module").map(String::as_str).unwrap_or("");
    format!("{} ", format!("{} {}", app, module).trim())
}

/// Keep one entry per line
///
/// A single trailing newline is dropped; embedded newlines, carriage returns
/// and tabs are escaped.
fn sanitize_message(message: &str) -> String {
    let message = message.strip_suffix('\n').unwrap_or(message);
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}
