//! ## sparring-telemetry::sink
//! **Line-oriented log sinks**
//!
//! Every component of the harness reports what it observed through an
//! injected `LogSink`. A sink must be callable from any task and must never
//! block for long: client actors call it from inside their I/O loop.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;
use tracing::warn;

/// Accepts one text line per call.
pub trait LogSink: Send + Sync {
    fn log(&self, line: &str);
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    #[inline]
    fn log(&self, line: &str) {
        (**self).log(line)
    }
}

/// Forwards lines to the global `tracing` subscriber (console).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, line: &str) {
        tracing::info!("{line}");
    }
}

/// Appends `YYYY-mm-dd HH:MM:SS - line` records to a file.
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileSink {
    /// Opens `path` for appending, creating parent directories as needed.
    /// With `truncate` set, existing content is discarded first.
    pub fn create<P: AsRef<Path>>(path: P, truncate: bool) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if truncate {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }
        let file = options.open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn log(&self, line: &str) {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut writer = self.writer.lock();
        let result = writeln!(writer, "{stamp} - {line}").and_then(|_| writer.flush());
        if let Err(e) = result {
            warn!("Failed to write log line to {}: {e}", self.path.display());
        }
    }
}

/// Keeps every line in memory. Used by tests and for post-run inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }

    /// Index of the first line containing `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.lines.lock().iter().position(|l| l.contains(needle))
    }

    pub fn count(&self, needle: &str) -> usize {
        self.lines.lock().iter().filter(|l| l.contains(needle)).count()
    }
}

impl LogSink for MemorySink {
    fn log(&self, line: &str) {
        self.lines.lock().push(line.to_owned());
    }
}

/// Fans each line out to several sinks, in order.
#[derive(Default, Clone)]
pub struct TeeSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl TeeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl LogSink for TeeSink {
    fn log(&self, line: &str) {
        for sink in &self.sinks {
            sink.log(line);
        }
    }
}
