use async_trait::async_trait;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::AsyncWriteExt;

/// Error reported by a [`LogSink`]. The writer swallows it.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("sink i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Destination for batches flushed by the [`AsyncWriter`](crate::writer::AsyncWriter).
///
/// `write` is only ever called from the writer's worker thread, one batch at
/// a time. A batch is a run of complete newline-terminated lines in arrival
/// order.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Write one batch.
    ///
    /// **Returns**
    /// - `Ok(())` if the backend accepted the batch.
    /// - `Err(..)` otherwise. The writer does not retry and does not
    ///   report it; the batch counts as handled either way.
    async fn write(&self, batch: &[u8]) -> Result<(), SinkError>;
}

/// Process standard output. This is the production sink.
#[derive(Clone, Debug, Default)]
pub struct StdoutSink;

#[async_trait]
impl LogSink for StdoutSink {
    async fn write(&self, batch: &[u8]) -> Result<(), SinkError> {
        let mut out = tokio::io::stdout();
        out.write_all(batch).await?;
        out.flush().await?;
        Ok(())
    }
}

/// Receives overflow diagnostics. Called synchronously on the producer's
/// thread, so implementations must not block for long.
pub trait DiagnosticOutput: Send + Sync {
    fn report(&self, line: &str);
}

/// Writes diagnostics to standard error.
#[derive(Clone, Debug, Default)]
pub struct StderrDiagnostics;

impl DiagnosticOutput for StderrDiagnostics {
    fn report(&self, line: &str) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", line);
    }
}

/// In-memory capture of everything written to it.
///
/// Clones share the same buffer. Works both as a [`LogSink`] and as a
/// [`DiagnosticOutput`], which makes it handy in tests and when embedding
/// the pipeline.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
    writes: Arc<Mutex<usize>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured content as text.
    pub fn contents(&self) -> String {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Captured content split into lines.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    /// Number of separate writes (batches or diagnostics) received.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn append(&self, bytes: &[u8]) {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(bytes);
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }
}

#[async_trait]
impl LogSink for MemorySink {
    async fn write(&self, batch: &[u8]) -> Result<(), SinkError> {
        self.append(batch);
        Ok(())
    }
}

impl DiagnosticOutput for MemorySink {
    fn report(&self, line: &str) {
        self.append(format!("{}\n", line).as_bytes());
    }
}
