use std::sync::Arc;
use std::time::{Duration, Instant};

use tasklog::config::LoggerConfig;
use tasklog::fields;
use tasklog::init::Logging;
use tasklog::noop_sink::NoopSink;
use tasklog::writer::WriterConfig;

/// Several producer threads against a large queue and a slower flush.
fn main() {
    let writer_config = WriterConfig::default()
        .with_queue_capacity(50_000)
        .with_flush_interval(Duration::from_millis(200));
    let logging = Logging::start(Arc::new(NoopSink), &LoggerConfig::default(), writer_config)
        .expect("start logging");

    let threads: u64 = 4;
    let per_thread: u64 = 25_000;
    let start = Instant::now();

    let producers: Vec<_> = (0..threads)
        .map(|t| {
            let log = logging.logger().with(&fields!["producer", t]);
            std::thread::spawn(move || {
                for i in 0..per_thread {
                    log.error("custom load test error", &fields!["iteration", i]);
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().expect("producer thread");
    }

    let elapsed = start.elapsed();
    logging.shutdown();

    let n = threads * per_thread;
    let stats = logging.writer().stats();
    println!(
        "custom config: sent {} events in {:?} (~{:.0} ev/s), accepted {}, dropped {}",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64(),
        stats.accepted,
        stats.dropped
    );
}
