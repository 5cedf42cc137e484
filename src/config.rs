use crate::env::{env_or, APP_ENV_ENV, LOG_LEVEL_ENV};
use crate::level::{parse_level, Severity};

/// Logger behavior chosen at startup.
///
/// Building one never fails: unknown level names become `Info` and any
/// environment name other than `production` means development mode.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoggerConfig {
    pub level: Severity,
    pub production: bool,
}

impl LoggerConfig {
    pub fn new(level: &str, app_env: &str) -> Self {
        Self {
            level: parse_level(level),
            production: is_production(app_env),
        }
    }

    /// Read `LOG_LEVEL` and `APP_ENV`.
    pub fn from_env() -> Self {
        Self::new(&env_or(LOG_LEVEL_ENV, ""), &env_or(APP_ENV_ENV, ""))
    }
}

/// `production` (any case) selects production mode.
pub fn is_production(app_env: &str) -> bool {
    app_env.trim().eq_ignore_ascii_case("production")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_parsing() {
        assert_eq!(
            LoggerConfig::new("WARN", "production"),
            LoggerConfig {
                level: Severity::Warn,
                production: true
            }
        );
        assert_eq!(LoggerConfig::new("nonsense", "staging"), LoggerConfig::default());
        assert_eq!(LoggerConfig::new("", ""), LoggerConfig::default());
    }

    #[test]
    fn reads_environment() {
        std::env::set_var(LOG_LEVEL_ENV, "Debug");
        std::env::set_var(APP_ENV_ENV, "PRODUCTION");
        let config = LoggerConfig::from_env();
        std::env::remove_var(LOG_LEVEL_ENV);
        std::env::remove_var(APP_ENV_ENV);

        assert_eq!(config.level, Severity::Debug);
        assert!(config.production);
    }
}
