use std::sync::Arc;

use crate::level::Severity;
use crate::record::{render_fields, LogRecord};
use crate::value::Value;
use crate::writer::AsyncWriter;

/// Unrecoverable fault raised by [`ScopedLogger::dpanic`] and
/// [`ScopedLogger::panic`] after the record has been emitted.
///
/// Callers are expected to propagate it up to whatever aborts the current
/// unit of work; it is not meant to be handled and retried.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LogFault {
    #[error("{0}")]
    DPanic(String),

    #[error("{0}")]
    Panic(String),
}

impl LogFault {
    pub fn message(&self) -> &str {
        match self {
            LogFault::DPanic(msg) | LogFault::Panic(msg) => msg,
        }
    }
}

/// Leveled logger carrying ordered context fields.
///
/// Values are immutable: [`with`](Self::with) returns a new logger with a
/// copy of the context fields plus the new ones, and never touches the
/// receiver. Clones are cheap and share the same [`AsyncWriter`].
///
/// A logger without a writer is the no-op variant: every emit is discarded
/// and `with` hands back an unchanged copy.
#[derive(Clone)]
pub struct ScopedLogger {
    threshold: Severity,
    production: bool,
    fields: Arc<Vec<Value>>,
    writer: Option<Arc<AsyncWriter>>,
}

impl ScopedLogger {
    /// Logger writing through `writer`, dropping everything below `threshold`.
    ///
    /// `production` only changes the behavior of [`dpanic`](Self::dpanic).
    pub fn new(writer: Arc<AsyncWriter>, threshold: Severity, production: bool) -> Self {
        Self {
            threshold,
            production,
            fields: Arc::new(Vec::new()),
            writer: Some(writer),
        }
    }

    /// Logger that discards everything.
    pub fn noop() -> Self {
        Self {
            threshold: Severity::Fatal,
            production: true,
            fields: Arc::new(Vec::new()),
            writer: None,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.writer.is_none()
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    /// Whether a record at `severity` would be built at all.
    pub fn enabled(&self, severity: Severity) -> bool {
        self.writer.is_some() && severity >= self.threshold
    }

    /// Derive a logger whose context is this one's followed by `fields`.
    pub fn with(&self, fields: &[Value]) -> ScopedLogger {
        if self.is_noop() {
            return self.clone();
        }
        let mut merged = Vec::with_capacity(self.fields.len() + fields.len());
        merged.extend(self.fields.iter().cloned());
        merged.extend_from_slice(fields);
        ScopedLogger {
            threshold: self.threshold,
            production: self.production,
            fields: Arc::new(merged),
            writer: self.writer.clone(),
        }
    }

    /// Build, encode and enqueue a record if `severity` passes the threshold.
    ///
    /// This is the common path of every leveled method; it never reports
    /// failure. Returns whether the record was built.
    pub fn emit(&self, severity: Severity, msg: &str, fields: &[Value]) -> bool {
        let Some(writer) = &self.writer else {
            return false;
        };
        if severity < self.threshold {
            return false;
        }
        let rendered = render_fields(self.fields.iter().chain(fields));
        let record = LogRecord::new(severity, msg, rendered);
        writer.enqueue(record.encode());
        true
    }

    pub fn debug(&self, msg: &str, fields: &[Value]) {
        self.emit(Severity::Debug, msg, fields);
    }

    pub fn info(&self, msg: &str, fields: &[Value]) {
        self.emit(Severity::Info, msg, fields);
    }

    pub fn warn(&self, msg: &str, fields: &[Value]) {
        self.emit(Severity::Warn, msg, fields);
    }

    pub fn error(&self, msg: &str, fields: &[Value]) {
        self.emit(Severity::Error, msg, fields);
    }

    /// Emit at `DPANIC`. Outside production mode the emitted record is
    /// followed by a [`LogFault::DPanic`]; in production mode this only logs.
    #[must_use = "a DPanic fault must be propagated"]
    pub fn dpanic(&self, msg: &str, fields: &[Value]) -> Result<(), LogFault> {
        if !self.emit(Severity::DPanic, msg, fields) || self.production {
            return Ok(());
        }
        Err(LogFault::DPanic(msg.to_owned()))
    }

    /// Emit at `PANIC`, then fail with [`LogFault::Panic`].
    #[must_use = "a Panic fault must be propagated"]
    pub fn panic(&self, msg: &str, fields: &[Value]) -> Result<(), LogFault> {
        if !self.emit(Severity::Panic, msg, fields) {
            return Ok(());
        }
        Err(LogFault::Panic(msg.to_owned()))
    }

    /// Emit at `FATAL` and exit the process with status 1.
    ///
    /// Before exiting, the writer's shutdown signal is raised and the final
    /// drain is awaited, so the fatal record itself reaches the sink unless
    /// it was dropped on a full queue. On the no-op logger this does nothing
    /// and returns.
    pub fn fatal(&self, msg: &str, fields: &[Value]) {
        if !self.emit(Severity::Fatal, msg, fields) {
            return;
        }
        if let Some(writer) = &self.writer {
            writer.terminate();
        }
        std::process::exit(1);
    }
}

impl Default for ScopedLogger {
    fn default() -> Self {
        Self::noop()
    }
}

impl std::fmt::Debug for ScopedLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedLogger")
            .field("threshold", &self.threshold)
            .field("production", &self.production)
            .field("fields", &self.fields)
            .field("noop", &self.is_noop())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;
    use crate::shutdown::Shutdown;
    use crate::sink::MemorySink;
    use crate::writer::WriterConfig;

    fn logger(threshold: Severity, production: bool) -> (ScopedLogger, Arc<AsyncWriter>, MemorySink) {
        let sink = MemorySink::new();
        let writer = Arc::new(
            AsyncWriter::spawn(Arc::new(sink.clone()), WriterConfig::default(), &Shutdown::new())
                .unwrap(),
        );
        (ScopedLogger::new(Arc::clone(&writer), threshold, production), writer, sink)
    }

    #[test]
    fn context_fields_precede_call_site_fields() {
        let (log, writer, sink) = logger(Severity::Debug, false);
        log.with(&fields!["a", 1]).info("hello", &fields!["b", 2]);
        writer.terminate();

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" INFO hello a=1 b=2"), "{}", lines[0]);
    }

    #[test]
    fn derivation_leaves_parent_untouched() {
        let (log, writer, sink) = logger(Severity::Debug, false);
        let child = log.with(&fields!["a", "x", "b", "y"]);
        let grandchild = child.with(&fields!["c", "z", "d", "w"]);
        child.info("child", &[]);
        grandchild.info("grandchild", &[]);
        writer.terminate();

        let lines = sink.lines();
        assert!(lines[0].ends_with("child a=x b=y"), "{}", lines[0]);
        assert!(lines[1].ends_with("grandchild a=x b=y c=z d=w"), "{}", lines[1]);
    }

    #[test]
    fn records_below_threshold_are_skipped() {
        let (log, writer, sink) = logger(Severity::Warn, true);
        log.debug("d", &[]);
        log.info("i", &[]);
        log.warn("w", &[]);
        log.error("e", &[]);
        writer.terminate();

        let lines = sink.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(" WARN w"));
        assert!(lines[1].contains(" ERROR e"));
        assert_eq!(writer.stats().accepted, 2);
    }

    #[test]
    fn dpanic_faults_only_outside_production() {
        let (dev, dev_writer, dev_sink) = logger(Severity::Info, false);
        assert_eq!(
            dev.dpanic("boom", &[]),
            Err(LogFault::DPanic("boom".to_string()))
        );
        dev_writer.terminate();
        assert!(dev_sink.contents().contains(" DPANIC boom"));

        let (prod, prod_writer, prod_sink) = logger(Severity::Info, true);
        assert_eq!(prod.dpanic("boom", &[]), Ok(()));
        prod_writer.terminate();
        assert!(prod_sink.contents().contains(" DPANIC boom"));
    }

    #[test]
    fn panic_always_faults_after_emitting() {
        let (log, writer, sink) = logger(Severity::Info, true);
        let fault = log.panic("unreachable state", &fields!["id", 9]).unwrap_err();
        assert_eq!(fault.message(), "unreachable state");
        writer.terminate();
        assert!(sink.contents().contains(" PANIC unreachable state id=9"));
    }

    #[test]
    fn noop_discards_everything() {
        let log = ScopedLogger::noop();
        let derived = log.with(&fields!["k", "v"]);
        assert!(derived.is_noop());
        assert!(!derived.emit(Severity::Fatal, "x", &[]));
        assert_eq!(derived.panic("x", &[]), Ok(()));
        assert_eq!(derived.dpanic("x", &[]), Ok(()));
        derived.fatal("still running", &[]);
    }
}
