use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

use tasklog::config::LoggerConfig;
use tasklog::env::{APP_ENV_ENV, LOG_LEVEL_ENV, TASKLOG_ADDR_ENV};
use tasklog::fields;
use tasklog::init::init_logging_with_config;
use tasklog::sink::StdoutSink;
use tasklog::task::{handler, InMemoryTaskRepository, TaskService};
use tasklog::value::Value;
use tasklog::writer::WriterConfig;

/// Task HTTP service.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Listen address.
    #[arg(long, env = TASKLOG_ADDR_ENV, default_value = "0.0.0.0:8080")]
    addr: String,

    /// Minimum log level (debug, info, warn, error, dpanic, panic, fatal).
    #[arg(long, env = LOG_LEVEL_ENV, default_value = "info")]
    log_level: String,

    /// Deployment environment; `production` enables production mode.
    #[arg(long, env = APP_ENV_ENV, default_value = "")]
    app_env: String,

    /// Log queue capacity; 0 keeps the default.
    #[arg(long, default_value_t = 0)]
    log_queue: usize,

    /// Log flush interval in milliseconds; 0 keeps the default.
    #[arg(long, default_value_t = 0)]
    log_flush_ms: u64,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = LoggerConfig::new(&cli.log_level, &cli.app_env);
    let writer_config = WriterConfig::default()
        .with_queue_capacity(cli.log_queue)
        .with_flush_interval(Duration::from_millis(cli.log_flush_ms));

    let logging = match init_logging_with_config(Arc::new(StdoutSink), &config, writer_config) {
        Ok(logging) => logging,
        Err(err) => {
            eprintln!("failed to start logging: {}", err);
            std::process::exit(1);
        }
    };
    let log = logging.logger().clone();
    log.info("Application starting...", &[]);

    let service = TaskService::new(Arc::new(InMemoryTaskRepository::new()));
    let app = handler::router(service, log.clone());

    let listener = match tokio::net::TcpListener::bind(&cli.addr).await {
        Ok(listener) => listener,
        Err(err) => {
            log.fatal("Failed to start server", &[Value::from("error"), Value::error(&err)]);
            return;
        }
    };
    log.info("Server is listening", &fields!["addr", cli.addr.as_str()]);

    let shutdown_log = log.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_signal().await;
            shutdown_log.info("Server is shutting down...", &[]);
        })
        .await;
    if let Err(err) = served {
        log.error("Server stopped with error", &[Value::from("error"), Value::error(&err)]);
    }

    let _ = tokio::task::spawn_blocking(move || logging.shutdown()).await;
}

async fn wait_for_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
