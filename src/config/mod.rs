//! Configuration management
//!
//! Configuration is loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Bootstrap administrator, created at startup when absent
    #[serde(default)]
    pub admin: Option<AdminBootstrap>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. `*` echoes the request origin so that
    /// credentialed requests keep working.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "data/coursehub.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session id
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Session lifetime in hours
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,
    /// Add the `Secure` attribute to the session cookie
    #[serde(default)]
    pub secure_cookie: bool,
    /// Interval between expired-session sweeps, in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_hours: default_ttl_hours(),
            secure_cookie: false,
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

fn default_cookie_name() -> String {
    "session".to_string()
}

/// Longest accepted session lifetime, one hundred years
pub const MAX_SESSION_TTL_HOURS: i64 = 8760 * 100;

fn default_ttl_hours() -> i64 {
    24
}

fn default_cleanup_interval() -> u64 {
    300
}

/// Administrator account seeded at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminBootstrap {
    #[serde(default = "default_admin_name")]
    pub name: String,
    pub email: String,
    pub password: String,
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - COURSEHUB_SERVER_HOST
    /// - COURSEHUB_SERVER_PORT
    /// - COURSEHUB_SERVER_CORS_ORIGINS (comma separated)
    /// - COURSEHUB_DATABASE_DRIVER
    /// - COURSEHUB_DATABASE_URL
    /// - COURSEHUB_SESSION_TTL_HOURS
    /// - COURSEHUB_ADMIN_NAME / COURSEHUB_ADMIN_EMAIL / COURSEHUB_ADMIN_PASSWORD
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the server unusable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session.ttl_hours) {
            return Err(ConfigError::ValidationError(format!(
                "session.ttl_hours must be between 1 and {}",
                MAX_SESSION_TTL_HOURS
            )));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if let Some(admin) = &self.admin {
            if admin.email.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "admin.email must not be empty".to_string(),
                ));
            }
            if admin.password.chars().count() < 8 {
                return Err(ConfigError::ValidationError(
                    "admin.password must be at least 8 characters".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        // Server configuration
        if let Ok(host) = std::env::var("COURSEHUB_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("COURSEHUB_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(origins) = std::env::var("COURSEHUB_SERVER_CORS_ORIGINS") {
            let origins: Vec<String> = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
            if !origins.is_empty() {
                self.server.cors_origins = origins;
            }
        }

        // Database configuration
        if let Ok(driver) = std::env::var("COURSEHUB_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("COURSEHUB_DATABASE_URL") {
            self.database.url = url;
        }

        // Session configuration
        if let Ok(ttl) = std::env::var("COURSEHUB_SESSION_TTL_HOURS") {
            if let Ok(ttl) = ttl.parse::<i64>() {
                if (1..=MAX_SESSION_TTL_HOURS).contains(&ttl) {
                    self.session.ttl_hours = ttl;
                }
            }
        }

        // Bootstrap admin: email and password must both be present to
        // create one, the name alone renames a configured admin
        let name = std::env::var("COURSEHUB_ADMIN_NAME").ok();
        let email = std::env::var("COURSEHUB_ADMIN_EMAIL").ok();
        let password = std::env::var("COURSEHUB_ADMIN_PASSWORD").ok();
        if let (Some(email), Some(password)) = (email, password) {
            let name = name
                .or_else(|| self.admin.as_ref().map(|a| a.name.clone()))
                .unwrap_or_else(default_admin_name);
            self.admin = Some(AdminBootstrap {
                name,
                email,
                password,
            });
        } else if let (Some(name), Some(admin)) = (name, self.admin.as_mut()) {
            admin.name = name;
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every config test that touches environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "COURSEHUB_SERVER_HOST",
    "COURSEHUB_SERVER_PORT",
    "COURSEHUB_SERVER_CORS_ORIGINS",
    "COURSEHUB_DATABASE_DRIVER",
    "COURSEHUB_DATABASE_URL",
    "COURSEHUB_SESSION_TTL_HOURS",
    "COURSEHUB_ADMIN_NAME",
    "COURSEHUB_ADMIN_EMAIL",
    "COURSEHUB_ADMIN_PASSWORD",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn valid_host_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            (0u8..=255, 0u8..=255, 0u8..=255, 0u8..=255)
                .prop_map(|(a, b, c, d)| format!("{}.{}.{}.{}", a, b, c, d)),
            Just("localhost".to_string()),
            Just("0.0.0.0".to_string()),
            "[a-z][a-z0-9]{0,10}".prop_map(|s| s),
        ]
    }

    fn valid_origin_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("*".to_string()),
            "[a-z]{3,10}".prop_map(|h| format!("https://{}.example.edu", h)),
            (1024u16..=65535).prop_map(|p| format!("http://localhost:{}", p)),
        ]
    }

    fn valid_config_strategy() -> impl Strategy<Value = Config> {
        (
            valid_host_strategy(),
            1u16..=65535,
            prop::collection::vec(valid_origin_strategy(), 1..4),
            prop_oneof![Just(DatabaseDriver::Sqlite), Just(DatabaseDriver::Mysql)],
            "[a-z][a-z0-9_/]{0,20}\\.db",
            1u32..=64,
            "[a-z]{3,12}",
            1i64..=720,
        )
            .prop_map(
                |(host, port, cors_origins, driver, url, max_connections, cookie, ttl)| Config {
                    server: ServerConfig {
                        host,
                        port,
                        cors_origins,
                    },
                    database: DatabaseConfig {
                        driver,
                        url,
                        max_connections,
                    },
                    session: SessionConfig {
                        cookie_name: cookie,
                        ttl_hours: ttl,
                        secure_cookie: false,
                        cleanup_interval_secs: 60,
                    },
                    admin: None,
                },
            )
    }

    fn malformed_yaml_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("server:\n  port: not_a_number".to_string()),
            Just("server:\n  host: [unclosed".to_string()),
            Just("database:\n  driver: oracle".to_string()),
            Just("session:\n  ttl_hours: many".to_string()),
            Just("server: {host: }}".to_string()),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Serializing any valid config and loading it back yields the same values.
        #[test]
        fn config_yaml_roundtrip(config in valid_config_strategy()) {
            let yaml = serde_yaml::to_string(&config).expect("Failed to serialize config");
            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "{}", yaml).expect("Failed to write config");

            let parsed = Config::load(file.path()).expect("Failed to parse config");

            prop_assert_eq!(config.server.host, parsed.server.host);
            prop_assert_eq!(config.server.port, parsed.server.port);
            prop_assert_eq!(config.server.cors_origins, parsed.server.cors_origins);
            prop_assert_eq!(config.database.driver, parsed.database.driver);
            prop_assert_eq!(config.database.url, parsed.database.url);
            prop_assert_eq!(config.database.max_connections, parsed.database.max_connections);
            prop_assert_eq!(config.session.cookie_name, parsed.session.cookie_name);
            prop_assert_eq!(config.session.ttl_hours, parsed.session.ttl_hours);
        }

        /// Malformed files produce a descriptive error instead of defaults.
        #[test]
        fn malformed_config_is_rejected(yaml in malformed_yaml_strategy()) {
            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "{}", yaml).expect("Failed to write config");

            let result = Config::load(file.path());
            prop_assert!(result.is_err(), "Malformed YAML should produce an error");
            prop_assert!(result.unwrap_err().to_string().len() > 10);
        }

        /// An environment port always wins over the file value.
        #[test]
        fn env_port_takes_precedence(file_port in 1u16..=65535, env_port in 1u16..=65535) {
            let _guard = lock_env();
            clear_env();

            let mut file = NamedTempFile::new().expect("Failed to create temp file");
            write!(file, "server:\n  port: {}\n", file_port).expect("Failed to write config");
            std::env::set_var("COURSEHUB_SERVER_PORT", env_port.to_string());

            let config = Config::load_with_env(file.path()).expect("Failed to load config");
            clear_env();

            prop_assert_eq!(config.server.port, env_port);
        }
    }
}
