use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

use crate::level::Severity;
use crate::value::Value;

/// A single rendered log entry.
///
/// Records are encoded to bytes as soon as they are built, so nothing in
/// here outlives the emit call that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

impl LogRecord {
    /// Build a record stamped with the current time.
    pub fn new(severity: Severity, message: impl Into<String>, fields: Vec<(String, String)>) -> Self {
        Self {
            timestamp: Utc::now(),
            severity,
            message: message.into(),
            fields,
        }
    }

    /// Encode as one newline-terminated line:
    /// `<timestamp> <LEVEL> <message> k1=v1 k2=v2`.
    pub fn encode(&self) -> Vec<u8> {
        let mut line = self.to_string();
        line.push('\n');
        line.into_bytes()
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
            self.severity,
            self.message
        )?;
        for (key, value) in &self.fields {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

/// Pair up an alternating key/value sequence.
///
/// A trailing element without a partner is dropped, and pairs whose key is
/// not a string are skipped.
pub fn render_fields<'a, I>(items: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut items = items.into_iter();
    let mut out = Vec::new();
    while let (Some(key), Some(value)) = (items.next(), items.next()) {
        if let Some(key) = key.as_key() {
            out.push((key.to_owned(), value.to_string()));
        }
    }
    out
}
