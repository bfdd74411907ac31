//! Error types for migration discovery, execution and scaffolding

use std::path::PathBuf;
use thiserror::Error;

use crate::definitions::MigrationDirection;

/// Boxed failure reported by the schema-migration engine
pub type EngineFailure = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for migration operations
pub type MigrationResult<T> = Result<T, MigrationError>;

#[derive(Debug, Error)]
pub enum MigrationError {
    /// The modules root could not be read. Fatal to the whole run.
    #[error("failed to read modules directory {}: {source}", .root.display())]
    Discovery {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid migration direction: {0}")]
    InvalidDirection(String),

    #[error("no {direction} migrations found for module: {module}")]
    NoMigrations {
        module: String,
        direction: MigrationDirection,
    },

    #[error("failed to list migration files for module {module}: {source}")]
    Locate {
        module: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to {} migrations for module {module}: {source}", .direction.verb())]
    Engine {
        module: String,
        direction: MigrationDirection,
        #[source]
        source: EngineFailure,
    },

    #[error("failed to read migration status for module {module}: {source}")]
    Status {
        module: String,
        #[source]
        source: EngineFailure,
    },

    #[error("invalid migration name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("failed to create migration files for module {module}: {source}")]
    ScaffoldIo {
        module: String,
        #[source]
        source: std::io::Error,
    },

    #[error("registered migration hook for module {module} failed: {source}")]
    Hook {
        module: String,
        #[source]
        source: EngineFailure,
    },
}

impl MigrationError {
    /// Module the failure is attributed to, if any
    pub fn module(&self) -> Option<&str> {
        match self {
            MigrationError::NoMigrations { module, .. }
            | MigrationError::Locate { module, .. }
            | MigrationError::Engine { module, .. }
            | MigrationError::Status { module, .. }
            | MigrationError::ScaffoldIo { module, .. }
            | MigrationError::Hook { module, .. } => Some(module),
            MigrationError::Discovery { .. }
            | MigrationError::InvalidDirection(_)
            | MigrationError::InvalidName { .. } => None,
        }
    }
}
