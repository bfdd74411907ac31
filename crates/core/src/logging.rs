//! # Structured Logging
//!
//! Tracing subscriber setup shared by every AutoVerse binary. Plain text for
//! local work, JSON lines when `LOG_FORMAT=json`. `RUST_LOG` always wins over
//! the configured level.

use serde_json::json;
use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{AppConfig, LogFormat};
use crate::errors::CoreError;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "warn")
    pub level: String,
    /// Enable JSON structured logging (vs plain text)
    pub json_format: bool,
    /// Environment filter (supports complex filters like "autoverse=debug,sqlx=warn")
    pub env_filter: Option<String>,
    /// Service name to include in the initialization record
    pub service_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            env_filter: None,
            service_name: None,
        }
    }
}

impl LoggingConfig {
    /// Derive logging settings from the application configuration
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            level: config.log_level.clone(),
            json_format: config.log_format == LogFormat::Json,
            env_filter: Some(format!("{},sqlx=warn", config.log_level)),
            service_name: None,
        }
    }

    /// Set service name
    pub fn with_service(mut self, name: &str) -> Self {
        self.service_name = Some(name.to_string());
        self
    }

    /// Set environment filter
    pub fn with_env_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    fn filter_directive(&self) -> &str {
        self.env_filter.as_deref().unwrap_or(&self.level)
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<(), CoreError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.filter_directive()))
        .map_err(|e| CoreError::logging(format!("invalid log filter: {}", e)))?;

    let installed = if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr).json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr))
            .try_init()
    };
    installed.map_err(|e| CoreError::logging(e.to_string()))?;

    if config.json_format {
        let mut init_msg = json!({
            "message": "Structured logging initialized",
            "level": config.level,
        });
        if let Some(name) = &config.service_name {
            init_msg["service_name"] = json!(name);
        }
        tracing::debug!(target: "autoverse::logging", "{}", init_msg);
    } else {
        tracing::debug!(
            target: "autoverse::logging",
            "Logging initialized (level: {}, format: text)",
            config.level
        );
    }

    Ok(())
}
