use anyhow::{Context, anyhow};
use std::env;

/// URL for accessing the PostgreSQL database (should contain a database name in the path)
pub const DB_URL: &str = "DATABASE_URL";
/// Maximum number of pooled database connections. Defaults to [DEFAULT_DB_MAX_CONNECTIONS].
pub const DB_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
/// Log level configuration for the application. For formatting info, see [tracing_subscriber's documentation](https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
pub const LOG_LEVEL: &str = "LOG_LEVEL";
/// Socket address the HTTP server binds to. Defaults to [DEFAULT_LISTEN_ADDRESS].
pub const LISTEN_ADDRESS: &str = "LISTEN_ADDRESS";

/// OpenTelemetry span export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_SPAN_EXPORT_URL: &str = "OTEL_SPAN_EXPORT_URL";
/// OpenTelemetry metrics export URL. Should be http://localhost:4317 by default, as the service should
/// have an OpenTelemetry collector sidecar which directs metrics to the correct place
pub const OTEL_METRIC_EXPORT_URL: &str = "OTEL_METRIC_EXPORT_URL";

pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Settings the server needs before it can start accepting requests
#[derive(Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    pub db_url: String,
    pub db_max_connections: u32,
    pub listen_address: String,
}

impl ServiceConfig {
    /// Reads the service configuration from the process environment
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the service configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, anyhow::Error> {
        let db_url = lookup(DB_URL).ok_or_else(|| anyhow!("{DB_URL} must be set"))?;
        let db_max_connections = match lookup(DB_MAX_CONNECTIONS) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("{DB_MAX_CONNECTIONS} must be a positive integer"))?,
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };
        let listen_address =
            lookup(LISTEN_ADDRESS).unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.to_owned());

        Ok(ServiceConfig {
            db_url,
            db_max_connections,
            listen_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let config = ServiceConfig::from_lookup(lookup_from(&[(DB_URL, "postgres://db/todo")]));
        assert_eq!(
            ServiceConfig {
                db_url: "postgres://db/todo".to_owned(),
                db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
                listen_address: DEFAULT_LISTEN_ADDRESS.to_owned(),
            },
            config.expect("config should load")
        );
    }

    #[test]
    fn reads_overrides() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            (DB_URL, "postgres://db/todo"),
            (DB_MAX_CONNECTIONS, "3"),
            (LISTEN_ADDRESS, "127.0.0.1:9000"),
        ]))
        .expect("config should load");
        assert_eq!(3, config.db_max_connections);
        assert_eq!("127.0.0.1:9000", config.listen_address);
    }

    #[test]
    fn requires_database_url() {
        assert!(ServiceConfig::from_lookup(lookup_from(&[])).is_err());
    }

    #[test]
    fn rejects_bad_pool_size() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            (DB_URL, "postgres://db/todo"),
            (DB_MAX_CONNECTIONS, "lots"),
        ]));
        assert!(config.is_err());
    }
}

