//! Output multiplexer.
//!
//! [`OutputWriter`] fans every finished record out to all registered
//! destinations. Destinations are fixed when the writer is built; a single
//! mutex serializes writes so lines from concurrent tasks never interleave.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::error::OutputError;

struct Destination {
    label: String,
    sink: Box<dyn Write + Send>,
}

/// Result of replicating one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteReport {
    /// Destinations that accepted the record.
    pub delivered: usize,
    /// Destinations whose write failed.
    pub failed: usize,
}

impl WriteReport {
    /// Returns `true` if every destination accepted the record.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Builder for [`OutputWriter`]; the only way to register destinations.
#[derive(Default)]
pub struct OutputWriterBuilder {
    destinations: Vec<Destination>,
}

impl OutputWriterBuilder {
    /// Adds the process's standard output.
    #[must_use]
    pub fn stdout(self) -> Self {
        self.destination("stdout", io::stdout())
    }

    /// Creates (or truncates) `path` and adds it as a destination.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Io`] if the file cannot be created.
    pub fn file(self, path: &Path) -> Result<Self, OutputError> {
        let file = File::create(path).map_err(|source| OutputError::Io {
            destination: path.display().to_string(),
            source,
        })?;
        Ok(self.destination(path.display().to_string(), file))
    }

    /// Adds an arbitrary sink under a label used in log messages.
    #[must_use]
    pub fn destination(mut self, label: impl Into<String>, sink: impl Write + Send + 'static) -> Self {
        self.destinations.push(Destination {
            label: label.into(),
            sink: Box::new(sink),
        });
        self
    }

    /// Freezes the destination list.
    #[must_use]
    pub fn build(self) -> OutputWriter {
        OutputWriter {
            destinations: Mutex::new(self.destinations),
            failures: AtomicUsize::new(0),
        }
    }
}

/// Thread-safe fan-in sink replicating records to every destination.
pub struct OutputWriter {
    destinations: Mutex<Vec<Destination>>,
    failures: AtomicUsize,
}

impl OutputWriter {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> OutputWriterBuilder {
        OutputWriterBuilder::default()
    }

    /// Number of registered destinations.
    #[must_use]
    pub fn destination_count(&self) -> usize {
        self.lock().len()
    }

    /// Total failed destination writes since the writer was built.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    /// Writes `line` plus a newline to every destination.
    pub fn write_line(&self, line: &str) -> WriteReport {
        self.write_bytes(line.as_bytes())
    }

    /// Writes `data` plus a newline to every destination.
    ///
    /// Each destination receives the whole record in a single write and is
    /// flushed before the next one; a failing destination is logged and
    /// skipped without affecting the others. Returns once every destination
    /// has been attempted.
    pub fn write_bytes(&self, data: &[u8]) -> WriteReport {
        let mut record = Vec::with_capacity(data.len() + 1);
        record.extend_from_slice(data);
        record.push(b'\n');

        let mut report = WriteReport::default();
        let mut destinations = self.lock();
        for dest in destinations.iter_mut() {
            match dest.sink.write_all(&record).and_then(|()| dest.sink.flush()) {
                Ok(()) => report.delivered += 1,
                Err(source) => {
                    report.failed += 1;
                    let err = OutputError::Io {
                        destination: dest.label.clone(),
                        source,
                    };
                    warn!(destination = %dest.label, error = %err, "output write failed");
                }
            }
        }
        drop(destinations);

        if report.failed > 0 {
            self.failures.fetch_add(report.failed, Ordering::Relaxed);
        }
        report
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Destination>> {
        self.destinations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for OutputWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let labels: Vec<String> = self.lock().iter().map(|d| d.label.clone()).collect();
        f.debug_struct("OutputWriter")
            .field("destinations", &labels)
            .field("failures", &self.failures())
            .finish()
    }
}

/// In-memory destination shared between a writer and a test.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(std::sync::Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap_or_else(PoisonError::into_inner)).into_owned()
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        self.contents().lines().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
