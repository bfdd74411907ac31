//! Module Discovery - enumerate installed modules under the modules root

use std::fs;
use std::path::PathBuf;

use crate::definitions::Module;
use crate::error::{MigrationError, MigrationResult};

/// Finds modules by scanning the modules root directory
#[derive(Debug, Clone)]
pub struct ModuleDiscovery {
    modules_root: PathBuf,
}

impl ModuleDiscovery {
    pub fn new(modules_root: impl Into<PathBuf>) -> Self {
        Self {
            modules_root: modules_root.into(),
        }
    }

    /// Resolve a module by name without touching the filesystem
    pub fn module(&self, name: &str) -> Module {
        Module::new(&self.modules_root, name)
    }

    /// List every directory under the modules root, sorted by name so bulk
    /// runs are reproducible regardless of filesystem enumeration order.
    /// Hidden directories are ignored.
    pub fn list_modules(&self) -> MigrationResult<Vec<Module>> {
        let discovery_error = |source| MigrationError::Discovery {
            root: self.modules_root.clone(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.modules_root).map_err(discovery_error)? {
            let entry = entry.map_err(discovery_error)?;
            if !entry.file_type().map_err(discovery_error)?.is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }

        names.sort();
        Ok(names.into_iter().map(|name| self.module(&name)).collect())
    }
}
