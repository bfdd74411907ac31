use crate::config::{ConfigError, ConfigSource};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

/// Configuration trait for application configuration
pub trait AppConfigTrait: Sized {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self, ConfigError>;

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError>;

    /// Get configuration source information for debugging
    fn config_sources(&self) -> HashMap<String, ConfigSource>;
}

/// Environment enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::invalid_value(
                "environment",
                s,
                "development, testing, or production",
            )),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let env_str = match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Production => "production",
        };
        write!(f, "{}", env_str)
    }
}

impl Environment {
    /// Log level used when `LOG_LEVEL` is not set
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Environment::Development => "debug",
            Environment::Testing => "warn",
            Environment::Production => "info",
        }
    }
}

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::invalid_value("log_format", s, "text or json")),
        }
    }
}

/// Database connection settings.
///
/// `url` wins when present; otherwise a postgres URL is assembled from the
/// individual parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub user: String,
    pub password: String,
    pub host: String,
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            user: "root".to_string(),
            password: String::new(),
            host: "localhost".to_string(),
            name: "autoverse".to_string(),
        }
    }
}

impl DatabaseConfig {
    /// Connection URL to hand to the pool
    pub fn connection_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let raw = format!("postgres://{}/{}", self.host, self.name);
        let mut url = Url::parse(&raw)
            .map_err(|e| ConfigError::invalid_value("DB_HOST", &self.host, e.to_string()))?;
        url.set_username(&self.user)
            .map_err(|_| ConfigError::invalid_value("DB_USER", &self.user, "valid user name"))?;
        if !self.password.is_empty() {
            url.set_password(Some(&self.password))
                .map_err(|_| ConfigError::invalid_value("DB_PASSWORD", "***", "valid password"))?;
        }
        Ok(url.to_string())
    }

    /// Connection URL with the password replaced, safe for logs
    pub fn masked_url(&self) -> String {
        self.connection_url()
            .ok()
            .and_then(|raw| Url::parse(&raw).ok())
            .map(|mut url| {
                if url.password().is_some() {
                    let _ = url.set_password(Some("***"));
                }
                url.to_string()
            })
            .unwrap_or_else(|| "postgres://***".to_string())
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub modules_root: PathBuf,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig::default(),
            modules_root: PathBuf::from("Modules"),
            log_level: Environment::Development.default_log_level().to_string(),
            log_format: LogFormat::Text,
        }
    }

    /// Load `.env` (if any) and then read the process environment
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(ConfigError::environment_error(format!(
                    "failed to load .env file: {}",
                    e
                )));
            }
        }
        Self::from_env()
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(env_str) = lookup("APP_ENV") {
            config.environment = env_str.parse()?;
        }

        config.database.url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        if let Some(user) = lookup("DB_USER") {
            config.database.user = user;
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            config.database.password = password;
        }
        if let Some(host) = lookup("DB_HOST") {
            config.database.host = host;
        }
        if let Some(name) = lookup("DB_NAME") {
            config.database.name = name;
        }

        if let Some(root) = lookup("MODULES_ROOT") {
            config.modules_root = PathBuf::from(root);
        }

        config.log_level = lookup("LOG_LEVEL")
            .unwrap_or_else(|| config.environment.default_log_level().to_string());
        if let Some(format) = lookup("LOG_FORMAT") {
            config.log_format = format.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Database URL with the password hidden, for logs and CLI output
    pub fn masked_database_url(&self) -> String {
        self.database.masked_url()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfigTrait for AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.modules_root.as_os_str().is_empty() {
            return Err(ConfigError::invalid_value(
                "modules_root",
                "",
                "path to the modules directory",
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(ConfigError::invalid_value(
                "log_level",
                &self.log_level,
                format!("one of: {}", valid_levels.join(", ")),
            ));
        }

        // DATABASE_URL or the DB_* parts must yield a usable URL.
        self.database.connection_url()?;

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let source = |key: &str, default: &str| {
            if env::var(key).is_ok() {
                ConfigSource::EnvVar(key.to_string())
            } else {
                ConfigSource::Default(default.to_string())
            }
        };

        let mut sources = HashMap::new();
        sources.insert("environment".to_string(), source("APP_ENV", "development"));
        sources.insert(
            "database".to_string(),
            source("DATABASE_URL", "assembled from DB_* variables"),
        );
        sources.insert("modules_root".to_string(), source("MODULES_ROOT", "Modules"));
        sources.insert(
            "log_level".to_string(),
            source("LOG_LEVEL", "based on environment"),
        );
        sources.insert("log_format".to_string(), source("LOG_FORMAT", "text"));
        sources
    }
}
