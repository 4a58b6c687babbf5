//! Store connection configuration.

use std::time::Duration;

use mongodb::options::{AuthMechanism, ClientOptions, Credential, WriteConcern};
use serde::Deserialize;

use crate::error::{StoreError, StoreResult};

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    27017
}

fn default_pool_size() -> u32 {
    10
}

fn default_journal() -> bool {
    true
}

fn default_max_time_ms() -> u64 {
    3000
}

/// Store connection configuration.
///
/// Read once at startup and handed to the [`ConnectionManager`]
/// (see [`crate::manager`]). The auth fields are only consulted when
/// `need_auth` is set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store host name.
    pub host: String,
    /// Store port.
    pub port: u16,
    /// Database name.
    pub database: String,
    /// Maximum connection pool size.
    pub pool_size: u32,
    /// Journaled write concern for write operations.
    pub journal: bool,
    /// Let the server assign document ids when `_id` is absent.
    ///
    /// The driver always delegates id assignment server-side; the flag is
    /// kept for the configuration surface.
    pub force_server_object_id: bool,
    /// Whether the store requires authentication.
    pub need_auth: bool,
    /// Auth mechanism name (e.g. `SCRAM-SHA-256`).
    pub auth_mechanism: Option<String>,
    /// Auth user.
    pub user: Option<String>,
    /// Auth password.
    pub password: Option<String>,
    /// Server-side execution bound attached to every operation, in
    /// milliseconds. Write operations use it as the write timeout.
    pub max_time_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: String::new(),
            pool_size: default_pool_size(),
            journal: default_journal(),
            force_server_object_id: true,
            need_auth: false,
            auth_mechanism: None,
            user: None,
            password: None,
            max_time_ms: default_max_time_ms(),
        }
    }
}

impl StoreConfig {
    /// Create a builder for configuration.
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::new()
    }

    /// The connection URI built from host, port and database name.
    pub fn connection_uri(&self) -> String {
        format!("mongodb://{}:{}/{}", self.host, self.port, self.database)
    }

    /// Server-side execution bound as a [`Duration`].
    pub fn max_time(&self) -> Duration {
        Duration::from_millis(self.max_time_ms)
    }

    /// The write concern attached to every write operation: journal flag
    /// from configuration plus the write timeout.
    pub fn write_concern(&self) -> WriteConcern {
        WriteConcern::builder()
            .journal(self.journal)
            .w_timeout(self.max_time())
            .build()
    }

    /// Convert to driver ClientOptions.
    pub async fn to_client_options(&self) -> StoreResult<ClientOptions> {
        if self.database.is_empty() {
            return Err(StoreError::config("database name is required"));
        }

        let mut options = ClientOptions::parse(self.connection_uri())
            .await
            .map_err(|e| StoreError::config(format!("failed to parse URI: {}", e)))?;

        options.app_name = Some("plinth".to_string());
        options.max_pool_size = Some(self.pool_size);
        options.write_concern = Some(WriteConcern::builder().journal(self.journal).build());

        if self.need_auth {
            options.credential = Some(self.credential()?);
        }

        Ok(options)
    }

    fn credential(&self) -> StoreResult<Credential> {
        let mechanism = match self.auth_mechanism.as_deref() {
            Some("SCRAM-SHA-1") => AuthMechanism::ScramSha1,
            Some("SCRAM-SHA-256") | None => AuthMechanism::ScramSha256,
            Some("PLAIN") => AuthMechanism::Plain,
            Some(other) => {
                return Err(StoreError::config(format!(
                    "unsupported auth mechanism: {}",
                    other
                )));
            }
        };

        let user = self
            .user
            .clone()
            .ok_or_else(|| StoreError::config("auth requires a user"))?;
        let password = self
            .password
            .clone()
            .ok_or_else(|| StoreError::config("auth requires a password"))?;

        Ok(Credential::builder()
            .username(user)
            .password(password)
            .mechanism(mechanism)
            .build())
    }
}

/// Builder for store configuration.
#[derive(Debug, Default)]
pub struct StoreConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    database: Option<String>,
    pool_size: Option<u32>,
    journal: Option<bool>,
    force_server_object_id: Option<bool>,
    need_auth: Option<bool>,
    auth_mechanism: Option<String>,
    user: Option<String>,
    password: Option<String>,
    max_time_ms: Option<u64>,
}

impl StoreConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the store host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the store port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the maximum pool size.
    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = Some(size);
        self
    }

    /// Enable or disable the journaled write concern.
    pub fn journal(mut self, enabled: bool) -> Self {
        self.journal = Some(enabled);
        self
    }

    /// Let the server assign document ids.
    pub fn force_server_object_id(mut self, enabled: bool) -> Self {
        self.force_server_object_id = Some(enabled);
        self
    }

    /// Require authentication with the given mechanism and credentials.
    pub fn auth(
        mut self,
        mechanism: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.need_auth = Some(true);
        self.auth_mechanism = Some(mechanism.into());
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    /// Set the per-operation server-side execution bound in milliseconds.
    pub fn max_time_ms(mut self, millis: u64) -> Self {
        self.max_time_ms = Some(millis);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> StoreResult<StoreConfig> {
        let database = self
            .database
            .ok_or_else(|| StoreError::config("database name is required"))?;

        Ok(StoreConfig {
            host: self.host.unwrap_or_else(default_host),
            port: self.port.unwrap_or_else(default_port),
            database,
            pool_size: self.pool_size.unwrap_or_else(default_pool_size),
            journal: self.journal.unwrap_or_else(default_journal),
            force_server_object_id: self.force_server_object_id.unwrap_or(true),
            need_auth: self.need_auth.unwrap_or(false),
            auth_mechanism: self.auth_mechanism,
            user: self.user,
            password: self.password,
            max_time_ms: self.max_time_ms.unwrap_or_else(default_max_time_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = StoreConfig::builder()
            .host("db.internal")
            .port(27018)
            .database("mydb")
            .pool_size(20)
            .max_time_ms(1500)
            .build()
            .unwrap();

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.database, "mydb");
        assert_eq!(config.pool_size, 20);
        assert_eq!(config.max_time(), Duration::from_millis(1500));
    }

    #[test]
    fn test_config_builder_missing_database() {
        let result = StoreConfig::builder().host("localhost").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_connection_uri() {
        let config = StoreConfig::builder().database("mydb").build().unwrap();
        assert_eq!(config.connection_uri(), "mongodb://localhost:27017/mydb");
    }

    #[tokio::test]
    async fn test_to_client_options() {
        let config = StoreConfig::builder()
            .database("mydb")
            .pool_size(5)
            .journal(true)
            .build()
            .unwrap();

        let options = config.to_client_options().await.unwrap();
        assert_eq!(options.app_name.as_deref(), Some("plinth"));
        assert_eq!(options.max_pool_size, Some(5));
        assert_eq!(
            options.write_concern.as_ref().and_then(|wc| wc.journal),
            Some(true)
        );
        assert!(options.credential.is_none());
    }

    #[tokio::test]
    async fn test_to_client_options_requires_database() {
        let config = StoreConfig::default();
        assert!(config.to_client_options().await.is_err());
    }

    #[tokio::test]
    async fn test_to_client_options_with_auth() {
        let config = StoreConfig::builder()
            .database("mydb")
            .auth("SCRAM-SHA-256", "app", "secret")
            .build()
            .unwrap();

        let options = config.to_client_options().await.unwrap();
        let credential = options.credential.expect("credential expected");
        assert_eq!(credential.username.as_deref(), Some("app"));
        assert_eq!(credential.mechanism, Some(AuthMechanism::ScramSha256));
    }

    #[tokio::test]
    async fn test_unknown_auth_mechanism() {
        let config = StoreConfig::builder()
            .database("mydb")
            .auth("MONGODB-X509", "app", "secret")
            .build()
            .unwrap();

        let result = config.to_client_options().await;
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[test]
    fn test_write_concern_carries_timeout() {
        let config = StoreConfig::builder()
            .database("mydb")
            .max_time_ms(2500)
            .build()
            .unwrap();

        let wc = config.write_concern();
        assert_eq!(wc.journal, Some(true));
        assert_eq!(wc.w_timeout, Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: StoreConfig = toml::from_str(r#"database = "mydb""#).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 27017);
        assert_eq!(config.pool_size, 10);
        assert!(config.journal);
        assert!(!config.need_auth);
        assert_eq!(config.max_time_ms, 3000);
    }
}
