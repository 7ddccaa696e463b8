//! PostgreSQL connection configuration.

use std::env;
use std::time::Duration;

use crate::error::{PgError, PgResult};

/// Environment variables consulted by [`PgConfig::from_env`], in order.
pub const URL_ENV_VARS: [&str; 2] = ["ATLAS_DATABASE_URL", "DATABASE_URL"];

/// Where and how [`PgAdapter`](crate::PgAdapter) connects.
#[derive(Debug, Clone)]
pub struct PgConfig {
    /// The URL this configuration was read from or renders to.
    pub url: String,
    /// Server host name or address.
    pub host: String,
    /// Server port, 5432 unless the URL names one.
    pub port: u16,
    /// Database holding the model tables. PostGIS must be installed in it.
    pub database: String,
    /// Role to log in as, `postgres` by default.
    pub user: String,
    /// Password for `user`, if the server asks for one.
    pub password: Option<String>,
    /// TLS negotiation.
    pub ssl_mode: SslMode,
    /// How long to wait for the server during connect.
    pub connect_timeout: Duration,
    /// Server-side limit applied to every statement of the session.
    pub statement_timeout: Option<Duration>,
    /// Reported in `pg_stat_activity`.
    pub application_name: Option<String>,
}

/// TLS negotiation, as in libpq's `sslmode`.
///
/// The adapter connects without TLS, so `Require` fails at connect time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// Never use TLS.
    Disable,
    /// Use TLS when the server offers it.
    #[default]
    Prefer,
    /// Refuse to connect without TLS.
    Require,
}

impl PgConfig {
    /// Parse a `postgres://` or `postgresql://` URL.
    ///
    /// Recognised query parameters are `sslmode`, `connect_timeout` (seconds),
    /// `statement_timeout` (milliseconds) and `application_name`.
    pub fn from_url(url: impl Into<String>) -> PgResult<Self> {
        let url = url.into();
        let parsed = url::Url::parse(&url)
            .map_err(|e| PgError::config(format!("invalid database URL: {}", e)))?;
        if !matches!(parsed.scheme(), "postgres" | "postgresql") {
            return Err(PgError::config(format!(
                "expected a postgres:// URL, got scheme '{}'",
                parsed.scheme()
            )));
        }

        let database = parsed.path().trim_start_matches('/');
        if database.is_empty() {
            return Err(PgError::config("missing database name in URL"));
        }

        let mut config = Self {
            host: parsed
                .host_str()
                .ok_or_else(|| PgError::config("missing host in URL"))?
                .to_string(),
            port: parsed.port().unwrap_or(5432),
            database: database.to_string(),
            user: match parsed.username() {
                "" => "postgres".to_string(),
                name => name.to_string(),
            },
            password: parsed.password().map(String::from),
            ssl_mode: SslMode::default(),
            connect_timeout: Duration::from_secs(30),
            statement_timeout: None,
            application_name: None,
            url: String::new(),
        };
        for (key, value) in parsed.query_pairs() {
            config.apply_param(&key, &value)?;
        }
        config.url = url;
        Ok(config)
    }

    fn apply_param(&mut self, key: &str, value: &str) -> PgResult<()> {
        let number = |what: &str| {
            value
                .parse::<u64>()
                .map_err(|_| PgError::config(format!("invalid {}: {}", what, value)))
        };
        match key {
            "sslmode" => {
                self.ssl_mode = match value {
                    "disable" => SslMode::Disable,
                    "prefer" => SslMode::Prefer,
                    "require" => SslMode::Require,
                    other => return Err(PgError::config(format!("invalid sslmode: {}", other))),
                }
            }
            "connect_timeout" => self.connect_timeout = Duration::from_secs(number(key)?),
            "statement_timeout" => {
                self.statement_timeout = Some(Duration::from_millis(number(key)?));
            }
            "application_name" => self.application_name = Some(value.to_string()),
            other => tracing::debug!(parameter = %other, "ignoring unknown connection parameter"),
        }
        Ok(())
    }

    /// Read the URL from `ATLAS_DATABASE_URL`, falling back to `DATABASE_URL`.
    pub fn from_env() -> PgResult<Self> {
        let url = URL_ENV_VARS
            .iter()
            .find_map(|name| env::var(name).ok())
            .ok_or_else(|| {
                PgError::config(format!("none of {} is set", URL_ENV_VARS.join(", ")))
            })?;
        Self::from_url(url)
    }

    /// Build a configuration piece by piece.
    pub fn builder() -> PgConfigBuilder {
        PgConfigBuilder::new()
    }

    /// The equivalent `tokio_postgres` configuration.
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        use tokio_postgres::config::SslMode as TlsMode;

        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user)
            .connect_timeout(self.connect_timeout)
            .ssl_mode(match self.ssl_mode {
                SslMode::Disable => TlsMode::Disable,
                SslMode::Prefer => TlsMode::Prefer,
                SslMode::Require => TlsMode::Require,
            });
        if let Some(password) = &self.password {
            config.password(password);
        }
        if let Some(name) = &self.application_name {
            config.application_name(name);
        }
        if let Some(timeout) = self.statement_timeout {
            config.options(format!("-c statement_timeout={}", timeout.as_millis()));
        }
        config
    }
}

/// Builds a [`PgConfig`] from a base URL or from a local database name.
///
/// Without a URL the server is assumed at `localhost:5432` as `postgres`.
#[derive(Debug, Default)]
pub struct PgConfigBuilder {
    url: Option<String>,
    database: Option<String>,
    password: Option<String>,
}

impl PgConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a URL; the other settings override its parts.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Connect to this database.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Authenticate with this password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> PgResult<PgConfig> {
        let mut config = match self.url {
            Some(url) => PgConfig::from_url(url)?,
            None => PgConfig {
                url: String::new(),
                host: "localhost".to_string(),
                port: 5432,
                database: String::new(),
                user: "postgres".to_string(),
                password: None,
                ssl_mode: SslMode::default(),
                connect_timeout: Duration::from_secs(30),
                statement_timeout: None,
                application_name: None,
            },
        };
        config.database = self.database.unwrap_or(config.database);
        config.password = self.password.or(config.password);
        if config.database.is_empty() {
            return Err(PgError::config("database name is required"));
        }

        let credentials = match &config.password {
            Some(password) => format!("{}:{}", config.user, password),
            None => config.user.clone(),
        };
        config.url = format!(
            "postgresql://{}@{}:{}/{}",
            credentials, config.host, config.port, config.database
        );
        Ok(config)
    }
}
