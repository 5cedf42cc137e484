use std::fmt;
use std::str::FromStr;

/// Severity of a log record, totally ordered from `Debug` to `Fatal`.
///
/// A [`ScopedLogger`](crate::logger::ScopedLogger) carries one of these as
/// its threshold; records below it are never built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(i8)]
pub enum Severity {
    Debug = -1,
    #[default]
    Info = 0,
    Warn = 1,
    Error = 2,
    DPanic = 3,
    Panic = 4,
    Fatal = 5,
}

impl Severity {
    /// Upper-case label used in encoded lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::DPanic => "DPANIC",
            Severity::Panic => "PANIC",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a level name to a [`Severity`].
///
/// Matching is case-insensitive and surrounding whitespace is ignored.
/// Anything unrecognized (including an empty string) yields `Info`; this
/// never fails.
pub fn parse_level(name: &str) -> Severity {
    match name.trim().to_ascii_lowercase().as_str() {
        "debug" => Severity::Debug,
        "info" => Severity::Info,
        "warn" | "warning" => Severity::Warn,
        "error" => Severity::Error,
        "dpanic" => Severity::DPanic,
        "panic" => Severity::Panic,
        "fatal" => Severity::Fatal,
        _ => Severity::Info,
    }
}

impl FromStr for Severity {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(parse_level(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names_case_insensitively() {
        assert_eq!(parse_level("DEBUG"), Severity::Debug);
        assert_eq!(parse_level("Warn"), Severity::Warn);
        assert_eq!(parse_level("warning"), Severity::Warn);
        assert_eq!(parse_level("dPanic"), Severity::DPanic);
        assert_eq!(parse_level("fatal"), Severity::Fatal);
    }

    #[test]
    fn unknown_names_fall_back_to_info() {
        assert_eq!(parse_level(""), Severity::Info);
        assert_eq!(parse_level("verbose"), Severity::Info);
        assert_eq!("trace".parse::<Severity>(), Ok(Severity::Info));
    }

    #[test]
    fn severities_are_ordered() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Error < Severity::DPanic);
        assert!(Severity::Panic < Severity::Fatal);
    }
}
