//! Migration Definitions - Core types shared by the migration system
//!
//! Modules, migration files, directions and the results reported back by
//! bulk runs and status queries.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::MigrationError;

/// Name of the per-module directory holding SQL migration files
pub const MIGRATIONS_DIR_NAME: &str = "migrations";

/// Length of the `YYYYMMDDHHMMSS` version prefix
pub const TIMESTAMP_LEN: usize = 14;

/// Migration direction for execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationDirection {
    /// Apply pending migrations (run `.up.sql` files)
    Up,
    /// Revert the most recent migration (run its `.down.sql` file)
    Down,
}

impl MigrationDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationDirection::Up => "up",
            MigrationDirection::Down => "down",
        }
    }

    /// File name suffix for migration files of this direction
    pub fn file_suffix(&self) -> &'static str {
        match self {
            MigrationDirection::Up => ".up.sql",
            MigrationDirection::Down => ".down.sql",
        }
    }

    pub(crate) fn verb(&self) -> &'static str {
        match self {
            MigrationDirection::Up => "apply",
            MigrationDirection::Down => "rollback",
        }
    }
}

impl FromStr for MigrationDirection {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(MigrationDirection::Up),
            "down" => Ok(MigrationDirection::Down),
            other => Err(MigrationError::InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for MigrationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An installed module, identified by its directory under the modules root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    /// `<modules_root>/<name>/migrations`; may not exist
    pub migrations_dir: PathBuf,
}

impl Module {
    pub fn new(modules_root: &Path, name: impl Into<String>) -> Self {
        let name = name.into();
        let migrations_dir = modules_root.join(&name).join(MIGRATIONS_DIR_NAME);
        Self {
            name,
            migrations_dir,
        }
    }
}

/// A migration file on disk: `<timestamp>_<description>.<direction>.sql`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationFile {
    pub version: i64,
    pub description: String,
    pub direction: MigrationDirection,
    pub path: PathBuf,
}

impl MigrationFile {
    /// Parse a migration file name. Returns `None` for anything that does
    /// not follow the naming convention.
    pub fn parse(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;

        let (stem, direction) = if let Some(stem) = file_name.strip_suffix(".up.sql") {
            (stem, MigrationDirection::Up)
        } else if let Some(stem) = file_name.strip_suffix(".down.sql") {
            (stem, MigrationDirection::Down)
        } else {
            return None;
        };

        let (timestamp, description) = stem.split_once('_')?;
        if timestamp.len() != TIMESTAMP_LEN || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if description.is_empty() {
            return None;
        }

        Some(Self {
            version: timestamp.parse().ok()?,
            description: description.to_string(),
            direction,
            path: path.to_path_buf(),
        })
    }
}

/// Check a module name or migration description: non-empty, ASCII
/// alphanumerics and `_` only. Both end up as path components and, for
/// descriptions, as SQL identifiers in the scaffold templates.
pub fn validate_name(name: &str) -> Result<(), MigrationError> {
    let invalid = |reason: &str| MigrationError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if let Some(c) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(invalid(&format!(
            "unexpected character {:?}; use letters, digits and '_'",
            c
        )));
    }
    Ok(())
}

/// What the schema-migration engine did for one module directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutcome {
    /// Versions applied (up) or reverted (down), oldest first
    Applied(Vec<i64>),
    /// Already at the latest (up) or nothing left to revert (down)
    NoChange,
}

/// Result of a bulk run across all modules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Modules the engine was invoked for, in processing order
    pub processed: Vec<String>,
    /// Modules without migration files for the direction
    pub skipped: Vec<String>,
}

/// Migration status of a single module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleStatus {
    pub module: String,
    /// Up migration files on disk, oldest first
    pub migrations: Vec<MigrationFile>,
    /// Newest applied version for this module, as reported by the engine
    pub current_version: Option<i64>,
    /// Files newer than the current version
    pub pending: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parsing() {
        assert_eq!("up".parse::<MigrationDirection>().unwrap(), MigrationDirection::Up);
        assert_eq!("down".parse::<MigrationDirection>().unwrap(), MigrationDirection::Down);

        for bad in ["", "UP", "sideways", "up "] {
            match bad.parse::<MigrationDirection>() {
                Err(MigrationError::InvalidDirection(given)) => assert_eq!(given, bad),
                other => panic!("expected InvalidDirection for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_module_paths() {
        let module = Module::new(Path::new("Modules"), "users");
        assert_eq!(module.name, "users");
        assert_eq!(module.migrations_dir, Path::new("Modules/users/migrations"));
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("add_price").is_ok());
        assert!(validate_name("Users2").is_ok());

        for bad in ["", "add price", "../users", "drop;table", "naïve"] {
            assert!(
                matches!(validate_name(bad), Err(MigrationError::InvalidName { .. })),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_parse_migration_file() {
        let file = MigrationFile::parse(Path::new(
            "Modules/users/migrations/20240105093000_create_users.up.sql",
        ))
        .unwrap();
        assert_eq!(file.version, 20240105093000);
        assert_eq!(file.description, "create_users");
        assert_eq!(file.direction, MigrationDirection::Up);

        let down = MigrationFile::parse(Path::new("20240105093000_add_email_index.down.sql")).unwrap();
        assert_eq!(down.direction, MigrationDirection::Down);
        assert_eq!(down.description, "add_email_index");
    }

    #[test]
    fn test_parse_rejects_foreign_files() {
        for name in [
            "README.md",
            "0001_initial_migration.sql",
            "2024_short.up.sql",
            "2024010509300x_bad.up.sql",
            "20240105093000_.up.sql",
            "20240105093000.up.sql",
        ] {
            assert!(MigrationFile::parse(Path::new(name)).is_none(), "{}", name);
        }
    }
}
