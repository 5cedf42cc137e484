use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::level::Severity;
use crate::logger::ScopedLogger;
use crate::value::Value;

/// `tracing_subscriber` layer that forwards `tracing` events into a
/// [`ScopedLogger`].
///
/// Libraries that log through `tracing` (axum, hyper, tokio) end up in the
/// same writer and sink as the service's own records, filtered by the same
/// threshold. The event's target is recorded as a `target` field ahead of
/// the event's own fields.
pub struct LoggerLayer {
    logger: ScopedLogger,
}

impl LoggerLayer {
    pub fn new(logger: ScopedLogger) -> Self {
        Self { logger }
    }
}

/// `TRACE` has no counterpart and is folded into `Debug`.
pub fn severity_of(level: &Level) -> Severity {
    match *level {
        Level::TRACE | Level::DEBUG => Severity::Debug,
        Level::INFO => Severity::Info,
        Level::WARN => Severity::Warn,
        Level::ERROR => Severity::Error,
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.logger.enabled(severity_of(metadata.level()))
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        let severity = severity_of(meta.level());
        if !self.logger.enabled(severity) {
            return;
        }

        let mut fields = vec![Value::from("target"), Value::from(meta.target())];
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        self.logger
            .emit(severity, message.as_deref().unwrap_or(""), &fields);
    }
}

/// Collects event fields as alternating key/value [`Value`]s, pulling the
/// `message` field out separately.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut Vec<Value>,
    pub message: &'a mut Option<String>,
}

impl FieldVisitor<'_> {
    fn push(&mut self, field: &Field, value: Value) {
        self.fields.push(Value::from(field.name()));
        self.fields.push(value);
    }
}

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.push(field, Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field, Value::error(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.push(field, Value::debug(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::Shutdown;
    use crate::sink::MemorySink;
    use crate::writer::{AsyncWriter, WriterConfig};
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    #[test]
    fn forwards_events_with_fields() {
        let sink = MemorySink::new();
        let writer = Arc::new(
            AsyncWriter::spawn(Arc::new(sink.clone()), WriterConfig::default(), &Shutdown::new())
                .unwrap(),
        );
        let logger = ScopedLogger::new(Arc::clone(&writer), Severity::Info, false);
        let subscriber = Registry::default().with(LoggerLayer::new(logger));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("filtered out");
            tracing::warn!(user_id = 42, ok = true, "login throttled");
        });
        writer.terminate();

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(" WARN login throttled target=tasklog::layer::tests"), "{}", lines[0]);
        assert!(lines[0].ends_with(" user_id=42 ok=true"), "{}", lines[0]);
    }

    #[test]
    fn noop_logger_disables_everything() {
        let subscriber = Registry::default().with(LoggerLayer::new(ScopedLogger::noop()));
        tracing::subscriber::with_default(subscriber, || {
            assert!(!tracing::enabled!(tracing::Level::ERROR));
        });
    }

    #[test]
    fn maps_levels() {
        assert_eq!(severity_of(&Level::TRACE), Severity::Debug);
        assert_eq!(severity_of(&Level::ERROR), Severity::Error);
    }
}
