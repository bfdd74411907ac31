//! Migration Function Registry
//!
//! Modules register their programmatic (non-file) migration logic here while
//! the application boots. The registry is built once by the binary and passed
//! by reference to whoever needs it. File-based migrations remain the
//! authoritative path: the orchestrator never looks at this registry, and the
//! callbacks only run through [`MigrationRegistry::run_registered`].

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::{EngineFailure, MigrationError, MigrationResult};

/// Schema changes owned by one module, bound to a database handle `H`
#[async_trait]
pub trait ModuleMigration<H>: Send + Sync
where
    H: Sync,
{
    /// Name of the owning module
    fn module(&self) -> &str;

    /// Run the module's migration logic
    async fn migrate(&self, db: &H) -> Result<(), EngineFailure>;
}

/// Ordered collection of module migration callbacks
pub struct MigrationRegistry<H> {
    entries: Mutex<Vec<Arc<dyn ModuleMigration<H>>>>,
}

impl<H> MigrationRegistry<H>
where
    H: Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Append a callback. Safe to call from concurrently initializing modules.
    pub fn register<M>(&self, migration: M)
    where
        M: ModuleMigration<H> + 'static,
    {
        let mut entries = self.lock();
        debug!(module = migration.module(), position = entries.len(), "registering module migration");
        entries.push(Arc::new(migration));
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Module names in registration order
    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|m| m.module().to_string()).collect()
    }

    /// Run every registered callback in registration order, stopping at the
    /// first failure. Returns the number of callbacks that ran.
    pub async fn run_registered(&self, db: &H) -> MigrationResult<usize> {
        let entries: Vec<_> = self.lock().clone();

        for entry in &entries {
            entry
                .migrate(db)
                .await
                .map_err(|source| MigrationError::Hook {
                    module: entry.module().to_string(),
                    source,
                })?;
            info!(module = entry.module(), "module migration hook completed");
        }

        Ok(entries.len())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<dyn ModuleMigration<H>>>> {
        // Entries are only ever appended, so a poisoned list is still consistent.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<H> Default for MigrationRegistry<H>
where
    H: Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
