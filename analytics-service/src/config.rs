use std::env::var;

use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppState<S> {
    pub store: S,
}

#[derive(Debug, Clone)]
pub struct EnvVars {
    /// Unset only in debug builds, where the service falls back to an in-memory store
    pub mongodb_uri: Option<String>,
    pub mongodb_db: Option<String>,
    pub port: u16,
    pub request_body_size_limit: usize,
    pub request_timeout_in_ms: u64,
}

impl Default for EnvVars {
    fn default() -> Self {
        EnvVars {
            mongodb_uri: None,
            mongodb_db: None,
            port: 3000,
            request_body_size_limit: 64 * 1024,
            request_timeout_in_ms: 30_000,
        }
    }
}

impl EnvVars {
    pub fn new() -> Self {
        let defaults = EnvVars::default();

        let mongodb_uri = match var("MONGODB_URI") {
            Ok(s) if !s.is_empty() => Some(s),
            _ => {
                if cfg!(not(debug_assertions)) {
                    panic!("MONGODB_URI is not allowed to be unset outside of a debug build");
                }
                warn!("MONGODB_URI not set. Events will only be kept in memory.");
                None
            }
        };

        let mongodb_db = match var("MONGODB_DB") {
            Ok(s) if !s.is_empty() => Some(s),
            _ => None,
        };

        let port = match var("PORT") {
            Ok(port_string) => port_string.parse().expect("PORT to be parseable as u16"),
            Err(_e) => {
                warn!("PORT not set. Defaulting to {}", defaults.port);
                defaults.port
            }
        };

        let request_timeout_in_ms = match var("REQUEST_TIMEOUT_IN_MS") {
            Ok(s) => s
                .parse()
                .expect("REQUEST_TIMEOUT_IN_MS to be valid unsigned integer"),
            Err(_e) => {
                warn!(
                    "REQUEST_TIMEOUT_IN_MS not set. Defaulting to {}",
                    defaults.request_timeout_in_ms
                );
                defaults.request_timeout_in_ms
            }
        };

        let request_body_size_limit = match var("REQUEST_BODY_SIZE_LIMIT") {
            Ok(s) => s
                .parse()
                .expect("REQUEST_BODY_SIZE_LIMIT to be valid unsigned integer"),
            Err(_e) => {
                warn!(
                    "REQUEST_BODY_SIZE_LIMIT not set. Defaulting to {}",
                    defaults.request_body_size_limit
                );
                defaults.request_body_size_limit
            }
        };

        EnvVars {
            mongodb_uri,
            mongodb_db,
            port,
            request_body_size_limit,
            request_timeout_in_ms,
        }
    }
}
