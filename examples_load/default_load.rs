use std::sync::Arc;
use std::time::Instant;

use tasklog::config::LoggerConfig;
use tasklog::fields;
use tasklog::init::Logging;
use tasklog::noop_sink::NoopSink;
use tasklog::writer::WriterConfig;

fn main() {
    let logging = Logging::start(Arc::new(NoopSink), &LoggerConfig::default(), WriterConfig::default())
        .expect("start logging");
    let log = logging.logger().with(&fields!["service", "default-load"]);

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        log.error("default load test error", &fields!["iteration", i]);
    }

    let elapsed = start.elapsed();
    logging.shutdown();

    let stats = logging.writer().stats();
    println!(
        "default config: sent {} events in {:?} (~{:.0} ev/s), accepted {}, dropped {}",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64(),
        stats.accepted,
        stats.dropped
    );
}
