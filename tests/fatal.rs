use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use tasklog::fields;
use tasklog::shutdown::Shutdown;
use tasklog::sink::StdoutSink;
use tasklog::{AsyncWriter, ScopedLogger, Severity, WriterConfig};

const CHILD_ENV: &str = "TASKLOG_FATAL_CHILD";
const LINES: usize = 50;

fn run_child() -> ! {
    // Nothing is flushed by the timer within the test's lifetime.
    let config = WriterConfig::default().with_flush_interval(Duration::from_secs(3600));
    let writer = Arc::new(AsyncWriter::spawn(Arc::new(StdoutSink), config, &Shutdown::new()).unwrap());
    let log = ScopedLogger::new(writer, Severity::Info, true);

    for i in 0..LINES {
        log.info("before fatal", &fields!["n", i]);
    }
    log.fatal("unrecoverable startup failure", &fields!["component", "child"]);
    unreachable!("fatal returned on a live logger");
}

#[test]
fn fatal_drains_pending_lines_then_exits_with_status_one() {
    if std::env::var_os(CHILD_ENV).is_some() {
        run_child();
    }

    let output = Command::new(std::env::current_exe().unwrap())
        .args([
            "fatal_drains_pending_lines_then_exits_with_status_one",
            "--exact",
            "--nocapture",
            "--test-threads=1",
        ])
        .env(CHILD_ENV, "1")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let before: Vec<&str> = stdout
        .lines()
        .filter(|l| l.contains(" INFO before fatal "))
        .collect();
    assert_eq!(before.len(), LINES);
    for (i, line) in before.iter().enumerate() {
        assert!(line.ends_with(&format!("n={}", i)), "{}", line);
    }
    assert!(stdout
        .lines()
        .any(|l| l.contains(" FATAL unrecoverable startup failure component=child")));
}
