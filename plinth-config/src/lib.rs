//! Configuration loading for the Plinth scaffold.
//!
//! One TOML file with `[server]`, `[store]` and `[log]` sections, read
//! once at startup:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1"
//! port = 8080
//! static_dir = "static"
//!
//! [[server.routes]]
//! method = "get"
//! path = "/users"
//! handler = "list_users"
//!
//! [store]
//! host = "localhost"
//! port = 27017
//! database = "appdb"
//! pool_size = 10
//! max_time_ms = 3000
//!
//! [log]
//! level = "info"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

pub use plinth_store::StoreConfig;

/// Default config file name (lives in the working directory).
pub const CONFIG_FILE_NAME: &str = "plinth.toml";

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not read the config file.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Could not parse the config file.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config parsed but is not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Document store configuration.
    pub store: StoreConfig,

    /// Logging configuration.
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.store.database.is_empty() {
            return Err(ConfigError::Invalid(
                "store.database must be set".to_string(),
            ));
        }
        for route in &self.server.routes {
            if route.handler.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "route {} has no handler",
                    route.path
                )));
            }
        }
        Ok(())
    }
}

/// HTTP server configuration, including the declarative route table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub bind: String,

    /// Listen port.
    pub port: u16,

    /// Directory served as static files, if any.
    pub static_dir: Option<String>,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Route table: (method, path) pairs mapped to named handlers.
    pub routes: Vec<RouteConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: None,
            request_timeout_secs: 30,
            routes: Vec::new(),
        }
    }
}

/// One route table entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    /// HTTP method.
    pub method: RouteMethod,

    /// URL path pattern.
    pub path: String,

    /// Name of the registered handler.
    pub handler: String,
}

/// Methods the route table dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMethod {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level filter (`trace`..`error`), `info` when unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    const EXAMPLE: &str = r#"
        [server]
        bind = "0.0.0.0"
        port = 9090
        static_dir = "static"

        [[server.routes]]
        method = "get"
        path = "/users"
        handler = "list_users"

        [[server.routes]]
        method = "post"
        path = "/users"
        handler = "create_user"

        [store]
        host = "db.internal"
        database = "appdb"
        pool_size = 4
        max_time_ms = 1500

        [log]
        level = "debug"
    "#;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(EXAMPLE).unwrap();

        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.static_dir.as_deref(), Some("static"));
        assert_eq!(config.server.routes.len(), 2);
        assert_eq!(config.server.routes[0].method, RouteMethod::Get);
        assert_eq!(config.server.routes[0].handler, "list_users");
        assert_eq!(config.server.routes[1].method, RouteMethod::Post);

        assert_eq!(config.store.host, "db.internal");
        assert_eq!(config.store.database, "appdb");
        assert_eq!(config.store.pool_size, 4);

        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str(r#"store = { database = "appdb" }"#).unwrap();

        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_secs, 30);
        assert!(config.server.routes.is_empty());
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXAMPLE.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.store.database, "appdb");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/plinth.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_validate_requires_database() {
        let result: Config = toml::from_str("").unwrap();
        assert!(matches!(
            result.validate(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_handler() {
        let config: Config = toml::from_str(
            r#"
            store = { database = "appdb" }

            [[server.routes]]
            method = "get"
            path = "/users"
            handler = ""
        "#,
        )
        .unwrap();

        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
