use crate::shutdown::{self, Shutdown};
use crate::sink::{DiagnosticOutput, LogSink, StderrDiagnostics};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{self, Duration, MissedTickBehavior};

pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Writer tuning.
///
/// **Fields**
/// - `queue_capacity`: maximum number of encoded lines waiting for the
///   worker before new ones are dropped. Also the byte size at which the
///   accumulated batch is flushed early.
/// - `flush_interval`: maximum time a non-empty batch waits before it is
///   written.
///
/// Zero values are replaced by the defaults when the writer is spawned.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriterConfig {
    pub queue_capacity: usize,
    pub flush_interval: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl WriterConfig {
    /// Set the queue capacity; zero is ignored.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        if capacity > 0 {
            self.queue_capacity = capacity;
        }
        self
    }

    /// Set the flush interval; a zero duration is ignored.
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        if !interval.is_zero() {
            self.flush_interval = interval;
        }
        self
    }

    fn normalized(self) -> Self {
        Self::default()
            .with_queue_capacity(self.queue_capacity)
            .with_flush_interval(self.flush_interval)
    }
}

/// Error returned when the background worker cannot be started.
#[derive(thiserror::Error, Debug)]
pub enum WriterError {
    #[error("failed to build log writer runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to spawn log writer thread: {0}")]
    Spawn(#[source] std::io::Error),
}

#[derive(Debug, Default)]
struct Counters {
    accepted: AtomicU64,
    dropped: AtomicU64,
    flushes: AtomicU64,
}

/// Point-in-time view of the writer's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriterStats {
    /// Lines accepted into the queue. Every accepted line reaches a flush.
    pub accepted: u64,
    /// Lines rejected because the queue was full or closed.
    pub dropped: u64,
    /// Batches handed to the sink.
    pub flushes: u64,
}

/// Bounded, batching log writer with a single background consumer.
///
/// Producers call [`enqueue`](Self::enqueue) from any thread; it never
/// blocks and drops the line when the queue is full. One worker thread
/// drains the queue in arrival order, accumulates lines into a batch and
/// writes the batch to the [`LogSink`] on every tick of the flush interval
/// or as soon as it reaches the size threshold.
///
/// Teardown is two-step: raise the [`Shutdown`] signal the writer was
/// spawned with, then call [`close`](Self::close). The worker drains
/// whatever is queued at that moment, flushes once and exits.
pub struct AsyncWriter {
    sender: mpsc::Sender<Vec<u8>>,
    shutdown: Shutdown,
    diagnostics: Arc<dyn DiagnosticOutput>,
    counters: Arc<Counters>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AsyncWriter {
    /// Spawn a writer whose overflow diagnostics go to standard error.
    pub fn spawn(
        sink: Arc<dyn LogSink>,
        config: WriterConfig,
        shutdown: &Shutdown,
    ) -> Result<Self, WriterError> {
        Self::spawn_with_diagnostics(sink, Arc::new(StderrDiagnostics), config, shutdown)
    }

    /// Spawn a writer and its worker thread.
    ///
    /// **Parameters**
    /// - `sink`: receives flushed batches.
    /// - `diagnostics`: receives one line per dropped record.
    /// - `config`: queue capacity and flush interval.
    /// - `shutdown`: cancellation signal that starts the final drain.
    ///
    /// The worker runs its own current-thread runtime, so the writer can be
    /// created and used with or without an ambient tokio runtime.
    pub fn spawn_with_diagnostics(
        sink: Arc<dyn LogSink>,
        diagnostics: Arc<dyn DiagnosticOutput>,
        config: WriterConfig,
        shutdown: &Shutdown,
    ) -> Result<Self, WriterError> {
        let config = config.normalized();
        let (tx, rx) = mpsc::channel::<Vec<u8>>(config.queue_capacity);
        let counters = Arc::new(Counters::default());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(WriterError::Runtime)?;

        let worker = Worker {
            rx,
            sink,
            cancel: shutdown.subscribe(),
            flush_interval: config.flush_interval,
            flush_threshold: config.queue_capacity,
            counters: Arc::clone(&counters),
        };

        let handle = std::thread::Builder::new()
            .name("log-writer".to_string())
            .spawn(move || runtime.block_on(worker.run()))
            .map_err(WriterError::Spawn)?;

        Ok(Self {
            sender: tx,
            shutdown: shutdown.clone(),
            diagnostics,
            counters,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Hand an encoded line to the worker without blocking.
    ///
    /// Returns `false` if the line was dropped, in which case a warning
    /// carrying the line has already been written to the diagnostic output.
    pub fn enqueue(&self, line: Vec<u8>) -> bool {
        match self.sender.try_send(line) {
            Ok(()) => {
                self.counters.accepted.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(line)) | Err(TrySendError::Closed(line)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                let text = String::from_utf8_lossy(&line);
                self.diagnostics.report(&format!(
                    "WARNING: Logger channel is full. Log message dropped: {}",
                    text.trim_end_matches('\n')
                ));
                false
            }
        }
    }

    /// Block until the worker has drained and exited.
    ///
    /// Only returns once the shutdown signal has been raised (or every
    /// producer handle is gone). Calling it again after completion returns
    /// immediately; concurrent callers all wait for the same completion.
    pub fn close(&self) {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = worker.take() {
            let _ = handle.join();
        }
    }

    /// Raise the shutdown signal and wait for the final drain.
    pub fn terminate(&self) {
        self.shutdown.trigger();
        self.close();
    }

    pub fn stats(&self) -> WriterStats {
        WriterStats {
            accepted: self.counters.accepted.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            flushes: self.counters.flushes.load(Ordering::Relaxed),
        }
    }
}

struct Worker {
    rx: mpsc::Receiver<Vec<u8>>,
    sink: Arc<dyn LogSink>,
    cancel: tokio::sync::watch::Receiver<bool>,
    flush_interval: Duration,
    flush_threshold: usize,
    counters: Arc<Counters>,
}

impl Worker {
    async fn run(self) {
        let Worker {
            mut rx,
            sink,
            mut cancel,
            flush_interval,
            flush_threshold,
            counters,
        } = self;

        let mut ticker = time::interval(flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut batch: Vec<u8> = Vec::with_capacity(flush_threshold.min(64 * 1024));

        loop {
            tokio::select! {
                biased;
                _ = shutdown::triggered(&mut cancel) => {
                    // Late senders see `Closed` and count the line as dropped.
                    // `recv` still yields everything sent before the close.
                    rx.close();
                    while let Some(line) = rx.recv().await {
                        batch.extend_from_slice(&line);
                    }
                    flush(&*sink, &mut batch, &counters).await;
                    return;
                }
                _ = ticker.tick() => {
                    flush(&*sink, &mut batch, &counters).await;
                }
                msg = rx.recv() => match msg {
                    Some(line) => {
                        batch.extend_from_slice(&line);
                        if batch.len() >= flush_threshold {
                            flush(&*sink, &mut batch, &counters).await;
                        }
                    }
                    None => {
                        flush(&*sink, &mut batch, &counters).await;
                        return;
                    }
                }
            }
        }
    }
}

async fn flush(sink: &dyn LogSink, batch: &mut Vec<u8>, counters: &Counters) {
    if batch.is_empty() {
        return;
    }
    // Fire-and-forget: the batch is handled whether or not the sink accepted it.
    let _ = sink.write(batch).await;
    counters.flushes.fetch_add(1, Ordering::Relaxed);
    batch.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use std::time::Instant;

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn zero_options_fall_back_to_defaults() {
        let config = WriterConfig::default()
            .with_queue_capacity(0)
            .with_flush_interval(Duration::ZERO);
        assert_eq!(config, WriterConfig::default());

        let raw = WriterConfig {
            queue_capacity: 0,
            flush_interval: Duration::ZERO,
        };
        assert_eq!(raw.normalized(), WriterConfig::default());
    }

    #[test]
    fn flushes_on_timer_tick() {
        let sink = MemorySink::new();
        let shutdown = Shutdown::new();
        let config = WriterConfig::default().with_flush_interval(Duration::from_millis(20));
        let writer = AsyncWriter::spawn(Arc::new(sink.clone()), config, &shutdown).unwrap();

        assert!(writer.enqueue(b"tick line\n".to_vec()));
        assert!(wait_until(|| sink.contents() == "tick line\n"));

        writer.terminate();
    }

    #[test]
    fn flushes_early_when_batch_reaches_threshold() {
        let sink = MemorySink::new();
        let shutdown = Shutdown::new();
        let config = WriterConfig::default()
            .with_queue_capacity(8)
            .with_flush_interval(Duration::from_secs(3600));
        let writer = AsyncWriter::spawn(Arc::new(sink.clone()), config, &shutdown).unwrap();

        assert!(writer.enqueue(b"longer than eight bytes\n".to_vec()));
        assert!(wait_until(|| !sink.contents().is_empty()));
        assert!(!shutdown.is_triggered());

        writer.terminate();
    }

    #[test]
    fn close_drains_queued_lines_exactly_once() {
        let sink = MemorySink::new();
        let shutdown = Shutdown::new();
        let config = WriterConfig::default().with_flush_interval(Duration::from_secs(3600));
        let writer = AsyncWriter::spawn(Arc::new(sink.clone()), config, &shutdown).unwrap();

        for i in 0..100 {
            assert!(writer.enqueue(format!("line {}\n", i).into_bytes()));
        }
        shutdown.trigger();
        writer.close();
        writer.close();

        let expected: Vec<String> = (0..100).map(|i| format!("line {}", i)).collect();
        assert_eq!(sink.lines(), expected);
        assert_eq!(sink.write_count(), 1);
        assert_eq!(writer.stats().accepted, 100);
        assert_eq!(writer.stats().dropped, 0);
    }

    #[test]
    fn enqueue_after_worker_exit_is_reported_as_drop() {
        let sink = MemorySink::new();
        let diagnostics = MemorySink::new();
        let shutdown = Shutdown::new();
        let writer = AsyncWriter::spawn_with_diagnostics(
            Arc::new(sink),
            Arc::new(diagnostics.clone()),
            WriterConfig::default(),
            &shutdown,
        )
        .unwrap();
        writer.terminate();

        assert!(!writer.enqueue(b"late\n".to_vec()));
        assert_eq!(
            diagnostics.lines(),
            vec!["WARNING: Logger channel is full. Log message dropped: late".to_string()]
        );
        assert_eq!(writer.stats().dropped, 1);
    }
}
