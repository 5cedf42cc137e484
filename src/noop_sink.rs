use crate::sink::LogSink;
use crate::sink::SinkError;
use async_trait::async_trait;

/// A sink that simply drops every flushed batch.
///
/// Useful for measuring the overhead of the pipeline itself without any
/// output I/O.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl LogSink for NoopSink {
    async fn write(&self, _batch: &[u8]) -> Result<(), SinkError> {
        Ok(())
    }
}
