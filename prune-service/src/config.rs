use sentry::types::Dsn;
use std::{env::var, time::Duration};
use tracing::{error, warn};

/// Markers younger than this could still collide with a live time bucket
pub const MIN_RETENTION: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct EnvVars {
    pub environment: Environment,
    pub mongodb_db: Option<String>,
    pub mongodb_uri: String,
    pub retention: Duration,
    pub sentry_dsn: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" => Environment::Development,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                warn!(
                    "ENVIRONMENT value '{}' is not valid. Defaulting to 'production'.",
                    other
                );
                Environment::Production
            }
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        };
        f.write_str(s)
    }
}

impl EnvVars {
    pub fn new() -> Self {
        let Ok(mongodb_uri) = var("MONGODB_URI") else {
            error!("MONGODB_URI not set");
            panic!("MONGODB_URI required");
        };
        assert!(!mongodb_uri.is_empty(), "MONGODB_URI must not be empty");

        let mongodb_db = match var("MONGODB_DB") {
            Ok(s) if !s.is_empty() => Some(s),
            _ => None,
        };

        let sentry_dsn = match var("SENTRY_DSN") {
            Ok(dsn_string) => {
                assert!(
                    valid_sentry_dsn(&dsn_string),
                    "SENTRY_DSN is not valid DSN."
                );
                Some(dsn_string)
            }
            Err(_e) => {
                if cfg!(not(debug_assertions)) {
                    panic!("SENTRY_DSN is not allowed to be unset outside of a debug build");
                }
                warn!("SENTRY_DSN not set.");
                None
            }
        };

        let retention = match var("DEDUPE_RETENTION_IN_S") {
            Ok(v) => match parse_retention(&v) {
                Ok(retention) => retention,
                Err(e) => panic!("DEDUPE_RETENTION_IN_S {e}"),
            },
            Err(_e) => {
                let seven_days_in_s = 7 * 24 * 60 * 60;
                Duration::from_secs(seven_days_in_s)
            }
        };

        let environment = match var("ENVIRONMENT") {
            Ok(v) => v.into(),
            Err(_e) => {
                warn!("ENVIRONMENT not set. Defaulting to 'production'.");
                Environment::Production
            }
        };

        // Optional timeout (in seconds) for the task to finish.
        // If TIMEOUT_SECS is not set or invalid, proceed without a timeout.
        let timeout_secs = match var("TIMEOUT_SECS") {
            Ok(val) => match val.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(secs),
                Ok(_) => {
                    warn!("TIMEOUT_SECS provided but not > 0; ignoring");
                    None
                }
                Err(e) => {
                    warn!("Failed to parse TIMEOUT_SECS ('{val}'): {e}; ignoring");
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            environment,
            mongodb_db,
            mongodb_uri,
            retention,
            sentry_dsn,
            timeout_secs,
        }
    }
}

pub fn parse_retention(v: &str) -> Result<Duration, String> {
    let seconds: u64 = v
        .trim()
        .parse()
        .map_err(|e| format!("is not a valid whole number of seconds: {e:?}"))?;
    let retention = Duration::from_secs(seconds);
    if retention < MIN_RETENTION {
        return Err(format!(
            "must be at least {} seconds",
            MIN_RETENTION.as_secs()
        ));
    }
    Ok(retention)
}

fn valid_sentry_dsn(url: &str) -> bool {
    url.parse::<Dsn>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_must_outlive_a_bucket() {
        assert_eq!(parse_retention("86400"), Ok(Duration::from_secs(86_400)));
        assert_eq!(parse_retention(" 60 "), Ok(MIN_RETENTION));
        assert!(parse_retention("59").is_err());
        assert!(parse_retention("-1").is_err());
        assert!(parse_retention("a week").is_err());
    }

    #[test]
    fn environment_parsing_defaults_to_production() {
        assert_eq!(
            Environment::from("Staging".to_string()),
            Environment::Staging
        );
        assert_eq!(
            Environment::from("qa".to_string()),
            Environment::Production
        );
        assert_eq!(Environment::Development.to_string(), "development");
    }
}
