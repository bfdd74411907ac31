//! Migration File Locator - decides whether a module has work for a direction
//!
//! The existence check never parses file names; ordering during application
//! is left to the engine, which sorts by the timestamp prefix.

use std::fs;
use std::io;

use crate::definitions::{MigrationDirection, MigrationFile, Module};
use crate::error::{MigrationError, MigrationResult};

/// Whether `module` has at least one `*.<direction>.sql` file.
///
/// A missing migrations directory or an empty match set is `Ok(false)`: that
/// is the normal state for modules without schema needs.
pub fn has_migrations(module: &Module, direction: MigrationDirection) -> MigrationResult<bool> {
    let suffix = direction.file_suffix();
    let found = scan(module, |name| name.ends_with(suffix))?;
    Ok(!found.is_empty())
}

/// Parsed migration files of `module` for `direction`, oldest first.
/// Files that do not follow the naming convention are left out.
pub fn migration_files(
    module: &Module,
    direction: MigrationDirection,
) -> MigrationResult<Vec<MigrationFile>> {
    let suffix = direction.file_suffix();
    let mut files: Vec<MigrationFile> = scan(module, |name| name.ends_with(suffix))?
        .into_iter()
        .filter_map(|name| MigrationFile::parse(&module.migrations_dir.join(name)))
        .collect();

    files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(files)
}

/// File names in the module's migrations directory accepted by `keep`
fn scan<F>(module: &Module, keep: F) -> MigrationResult<Vec<String>>
where
    F: Fn(&str) -> bool,
{
    let locate_error = |source| MigrationError::Locate {
        module: module.name.clone(),
        source,
    };

    let entries = match fs::read_dir(&module.migrations_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(locate_error(e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(locate_error)?;
        if !entry.file_type().map_err(locate_error)?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if keep(name) {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn module_with_files(root: &TempDir, name: &str, files: &[&str]) -> Module {
        let module = Module::new(root.path(), name);
        fs::create_dir_all(&module.migrations_dir).unwrap();
        for file in files {
            fs::write(module.migrations_dir.join(file), "SELECT 1;").unwrap();
        }
        module
    }

    #[test]
    fn test_missing_directory_means_no_migrations() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("auth")).unwrap();
        let module = Module::new(root.path(), "auth");

        assert!(!module.migrations_dir.is_dir());
        assert!(!has_migrations(&module, MigrationDirection::Up).unwrap());
        assert!(!has_migrations(&module, MigrationDirection::Down).unwrap());
    }

    #[test]
    fn test_matches_direction_suffix_only() {
        let root = TempDir::new().unwrap();
        let module = module_with_files(
            &root,
            "users",
            &["20240101000000_create_users.up.sql", "notes.txt"],
        );

        assert!(has_migrations(&module, MigrationDirection::Up).unwrap());
        assert!(!has_migrations(&module, MigrationDirection::Down).unwrap());
    }

    #[test]
    fn test_empty_directory_means_no_migrations() {
        let root = TempDir::new().unwrap();
        let module = module_with_files(&root, "users", &[]);

        assert!(module.migrations_dir.is_dir());
        assert!(!has_migrations(&module, MigrationDirection::Up).unwrap());
    }

    #[test]
    fn test_migration_files_sorted_by_timestamp() {
        let root = TempDir::new().unwrap();
        let module = module_with_files(
            &root,
            "users",
            &[
                "20240301000000_add_email.up.sql",
                "20240101000000_create_users.up.sql",
                "20240101000000_create_users.down.sql",
                "20240201000000_add_name.up.sql",
                "0001_initial_migration.up.sql",
            ],
        );

        let files = migration_files(&module, MigrationDirection::Up).unwrap();
        let versions: Vec<_> = files.iter().map(|f| f.version).collect();
        assert_eq!(versions, vec![20240101000000, 20240201000000, 20240301000000]);
        assert!(files.iter().all(|f| f.direction == MigrationDirection::Up));
    }
}
