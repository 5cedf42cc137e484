//! Per-request correlation tokens in the W3C `traceparent` layout.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Field name under which the token is attached to every record of a request.
pub const TRACEPARENT_FIELD: &str = "traceparent";

const VERSION: u8 = 0;
const SAMPLE_EVERY: u64 = 100;

/// Identifier bundle for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationToken {
    pub version: u8,
    pub trace_id: u128,
    pub span_id: u64,
    pub sampled: bool,
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}-{:032x}-{:016x}-{}",
            self.version,
            self.trace_id,
            self.span_id,
            if self.sampled { "01" } else { "00" }
        )
    }
}

/// Produces correlation tokens with random ids and deterministic sampling.
///
/// Generation `n` (counting from zero) is sampled when `n % 100 == 0`.
/// The counter is advanced with a single fetch-and-add, so concurrent
/// generations never observe the same value.
#[derive(Debug, Default)]
pub struct CorrelationGenerator {
    generated: AtomicU64,
}

impl CorrelationGenerator {
    pub const fn new() -> Self {
        Self {
            generated: AtomicU64::new(0),
        }
    }

    /// The process-wide generator used by the request middleware.
    pub fn global() -> &'static CorrelationGenerator {
        static GLOBAL: CorrelationGenerator = CorrelationGenerator::new();
        &GLOBAL
    }

    pub fn generate(&self) -> CorrelationToken {
        let trace_id: u128 = rand::random();
        let span_id: u64 = rand::random();
        let seen = self.generated.fetch_add(1, Ordering::Relaxed);
        CorrelationToken {
            version: VERSION,
            trace_id,
            span_id,
            sampled: seen % SAMPLE_EVERY == 0,
        }
    }

    /// Number of tokens generated so far.
    pub fn generated(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }
}
