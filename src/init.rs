use crate::config::LoggerConfig;
use crate::layer::LoggerLayer;
use crate::logger::ScopedLogger;
use crate::shutdown::Shutdown;
use crate::sink::{LogSink, StdoutSink};
use crate::writer::{AsyncWriter, WriterConfig, WriterError};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Error returned while setting up the logging pipeline.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Writer(#[from] WriterError),

    #[error("failed to install global tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// A running pipeline: the process-wide writer, its shutdown signal and the
/// base logger every request logger is derived from.
pub struct Logging {
    writer: Arc<AsyncWriter>,
    logger: ScopedLogger,
    shutdown: Shutdown,
}

impl Logging {
    /// Spawn the writer over `sink` and build the base logger.
    ///
    /// Nothing global is installed; see [`init_logging_with_config`] for
    /// that.
    pub fn start(
        sink: Arc<dyn LogSink>,
        config: &LoggerConfig,
        writer_config: WriterConfig,
    ) -> Result<Self, WriterError> {
        let shutdown = Shutdown::new();
        let writer = Arc::new(AsyncWriter::spawn(sink, writer_config, &shutdown)?);
        let logger = ScopedLogger::new(Arc::clone(&writer), config.level, config.production);
        Ok(Self {
            writer,
            logger,
            shutdown,
        })
    }

    pub fn logger(&self) -> &ScopedLogger {
        &self.logger
    }

    pub fn writer(&self) -> &Arc<AsyncWriter> {
        &self.writer
    }

    pub fn shutdown_signal(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Raise the shutdown signal and block until the writer has drained.
    pub fn shutdown(&self) {
        self.writer.terminate();
    }
}

/// Start the pipeline over `sink` and install a global `tracing` subscriber
/// forwarding into it.
///
/// **Parameters**
/// - `sink`: destination of flushed batches.
/// - `config`: threshold and production mode of the base logger.
/// - `writer_config`: queue capacity and flush interval.
///
/// Fails if the writer thread cannot start or a global subscriber is
/// already installed.
pub fn init_logging_with_config(
    sink: Arc<dyn LogSink>,
    config: &LoggerConfig,
    writer_config: WriterConfig,
) -> Result<Logging, InitError> {
    let logging = Logging::start(sink, config, writer_config)?;
    let subscriber = Registry::default().with(LoggerLayer::new(logging.logger().clone()));
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        logging.shutdown();
        return Err(err.into());
    }
    Ok(logging)
}

/// Start the pipeline on standard output with the default writer settings.
pub fn init_logging(config: &LoggerConfig) -> Result<Logging, InitError> {
    init_logging_with_config(Arc::new(StdoutSink), config, WriterConfig::default())
}
