//! Environment variable names read by [`LoggerConfig::from_env`](crate::config::LoggerConfig::from_env)
//! and the `tasklog` binary.

/// Minimum severity name, e.g. `debug` or `WARN`. Unknown values mean `info`.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Deployment environment; the value `production` enables production mode.
pub const APP_ENV_ENV: &str = "APP_ENV";

/// Listen address of the HTTP service.
pub const TASKLOG_ADDR_ENV: &str = "TASKLOG_ADDR";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
