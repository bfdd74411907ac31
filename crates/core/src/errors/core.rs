use thiserror::Error;

use crate::config::ConfigError;

/// Core error type for the AutoVerse scaffold
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Migration error: {message}")]
    Migration {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Logging error: {message}")]
    Logging { message: String },
}

impl CoreError {
    /// Create a new database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a new migration error wrapping the failure that caused it
    pub fn migration_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Migration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new logging error
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
