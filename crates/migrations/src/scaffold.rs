//! Migration Scaffolder - create timestamped up/down migration file pairs
//!
//! Both files are written under temporary names first and only renamed into
//! place once both writes succeeded, so a failed scaffold never leaves a
//! lone `.up.sql` behind for the engine to pick up.

use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::definitions::{validate_name, Module, MIGRATIONS_DIR_NAME};
use crate::error::{MigrationError, MigrationResult};

/// Paths of a freshly scaffolded migration pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldedMigration {
    pub version: String,
    pub up_path: PathBuf,
    pub down_path: PathBuf,
}

/// Writes new migration files into `<modules_root>/<module>/migrations`
#[derive(Debug, Clone)]
pub struct MigrationScaffolder {
    modules_root: PathBuf,
}

impl MigrationScaffolder {
    pub fn new(modules_root: impl Into<PathBuf>) -> Self {
        Self {
            modules_root: modules_root.into(),
        }
    }

    /// Create `<timestamp>_<description>.up.sql` and `.down.sql` for `module`,
    /// using the current local time as the version.
    pub fn create_migration(
        &self,
        module: &str,
        description: &str,
    ) -> MigrationResult<ScaffoldedMigration> {
        let timestamp = Local::now().format("%Y%m%d%H%M%S").to_string();
        self.create_migration_at(module, description, &timestamp)
    }

    /// Same as [`create_migration`](Self::create_migration) with an explicit
    /// version prefix.
    pub fn create_migration_at(
        &self,
        module: &str,
        description: &str,
        timestamp: &str,
    ) -> MigrationResult<ScaffoldedMigration> {
        validate_name(module)?;
        validate_name(description)?;

        let target = Module::new(&self.modules_root, module);
        let io_error = |source| MigrationError::ScaffoldIo {
            module: module.to_string(),
            source,
        };

        fs::create_dir_all(&target.migrations_dir).map_err(io_error)?;

        let base = format!("{}_{}", timestamp, description);
        let up_path = target.migrations_dir.join(format!("{}.up.sql", base));
        let down_path = target.migrations_dir.join(format!("{}.down.sql", base));

        for path in [&up_path, &down_path] {
            if path.exists() {
                return Err(io_error(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} already exists", path.display()),
                )));
            }
        }

        let pair = [
            (up_path.clone(), up_template(&base, description)),
            (down_path.clone(), down_template(&base, description)),
        ];
        write_all_or_nothing(&pair).map_err(io_error)?;

        info!(
            module,
            up = %up_path.display(),
            down = %down_path.display(),
            "created migration files"
        );

        Ok(ScaffoldedMigration {
            version: timestamp.to_string(),
            up_path,
            down_path,
        })
    }

    pub fn migrations_dir(&self, module: &str) -> PathBuf {
        self.modules_root.join(module).join(MIGRATIONS_DIR_NAME)
    }
}

fn up_template(base: &str, description: &str) -> String {
    format!(
        "-- {base}.up.sql\n\
         -- Add your SQL statements here\n\
         \n\
         -- Example: Create a table\n\
         CREATE TABLE {description} (\n    \
         id INTEGER PRIMARY KEY,\n    \
         created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,\n    \
         updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP\n\
         );\n"
    )
}

fn down_template(base: &str, description: &str) -> String {
    format!(
        "-- {base}.down.sql\n\
         -- Add your SQL statements here\n\
         \n\
         -- Example: Drop the table\n\
         DROP TABLE IF EXISTS {description};\n"
    )
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

/// Stage every file, then rename them into place. On any failure, staged
/// and already renamed files are removed again.
fn write_all_or_nothing(files: &[(PathBuf, String)]) -> io::Result<()> {
    let mut staged = Vec::with_capacity(files.len());
    for (path, contents) in files {
        let tmp = staging_path(path);
        if let Err(e) = fs::write(&tmp, contents) {
            let _ = fs::remove_file(&tmp);
            discard(&staged);
            return Err(e);
        }
        staged.push(tmp);
    }

    let mut placed: Vec<&Path> = Vec::with_capacity(files.len());
    for ((path, _), tmp) in files.iter().zip(&staged) {
        if let Err(e) = fs::rename(tmp, path) {
            discard(&staged);
            discard(&placed);
            return Err(e);
        }
        placed.push(path);
    }
    Ok(())
}

fn discard<P: AsRef<Path>>(paths: &[P]) {
    for path in paths {
        let path = path.as_ref();
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "failed to clean up partial migration file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{MigrationDirection, MigrationFile};
    use tempfile::TempDir;

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_creates_exactly_one_pair() {
        let root = TempDir::new().unwrap();
        let scaffolder = MigrationScaffolder::new(root.path());

        let created = scaffolder.create_migration("widgets", "add_price").unwrap();

        let names = file_names(&scaffolder.migrations_dir("widgets"));
        assert_eq!(names.len(), 2);
        assert_eq!(created.version.len(), 14);
        assert!(created.version.bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(
            names,
            vec![
                format!("{}_add_price.down.sql", created.version),
                format!("{}_add_price.up.sql", created.version),
            ]
        );

        let up = MigrationFile::parse(&created.up_path).unwrap();
        let down = MigrationFile::parse(&created.down_path).unwrap();
        assert_eq!(up.version, down.version);
        assert_eq!(up.direction, MigrationDirection::Up);
        assert_eq!(down.direction, MigrationDirection::Down);
    }

    #[test]
    fn test_template_contents() {
        let root = TempDir::new().unwrap();
        let scaffolder = MigrationScaffolder::new(root.path());

        let created = scaffolder
            .create_migration_at("widgets", "add_price", "20240105093000")
            .unwrap();

        let up = fs::read_to_string(&created.up_path).unwrap();
        assert!(up.starts_with("-- 20240105093000_add_price.up.sql\n"));
        assert!(up.contains("CREATE TABLE add_price (\n    id INTEGER PRIMARY KEY,"));
        assert!(up.contains("    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP\n);"));

        let down = fs::read_to_string(&created.down_path).unwrap();
        assert!(down.starts_with("-- 20240105093000_add_price.down.sql\n"));
        assert!(down.contains("DROP TABLE IF EXISTS add_price;"));
    }

    #[test]
    fn test_rejects_invalid_names_without_touching_disk() {
        let root = TempDir::new().unwrap();
        let scaffolder = MigrationScaffolder::new(root.path());

        for (module, description) in [("", "add_price"), ("widgets", ""), ("../etc", "x"), ("widgets", "add price")] {
            let err = scaffolder.create_migration(module, description).unwrap_err();
            assert!(matches!(err, MigrationError::InvalidName { .. }));
        }
        assert!(file_names(root.path()).is_empty());
    }

    #[test]
    fn test_existing_pair_is_not_overwritten() {
        let root = TempDir::new().unwrap();
        let scaffolder = MigrationScaffolder::new(root.path());

        let first = scaffolder
            .create_migration_at("widgets", "add_price", "20240105093000")
            .unwrap();
        fs::write(&first.up_path, "-- edited").unwrap();

        let err = scaffolder
            .create_migration_at("widgets", "add_price", "20240105093000")
            .unwrap_err();
        assert!(matches!(err, MigrationError::ScaffoldIo { ref module, .. } if module == "widgets"));
        assert_eq!(fs::read_to_string(&first.up_path).unwrap(), "-- edited");
    }

    #[test]
    fn test_failed_rename_leaves_nothing_behind() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("migrations");
        fs::create_dir(&dir).unwrap();

        let up = dir.join("20240105093000_add_price.up.sql");
        // A directory at the down target makes its rename fail.
        let down = dir.join("20240105093000_add_price.down.sql");
        fs::create_dir(&down).unwrap();
        fs::write(down.join("keep"), "").unwrap();

        let result = write_all_or_nothing(&[
            (up.clone(), "up".to_string()),
            (down.clone(), "down".to_string()),
        ]);

        assert!(result.is_err());
        assert!(!up.exists());
        assert_eq!(
            file_names(&dir),
            vec!["20240105093000_add_price.down.sql".to_string()]
        );
    }

    #[test]
    fn test_missing_module_directory_is_created() {
        let root = TempDir::new().unwrap();
        let scaffolder = MigrationScaffolder::new(root.path().join("Modules"));

        let created = scaffolder.create_migration("billing", "create_invoices").unwrap();
        assert!(created.up_path.starts_with(root.path().join("Modules/billing/migrations")));
        assert!(created.down_path.exists());
    }
}
