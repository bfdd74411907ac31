//! Migration Orchestrator - sequences discovery, location and engine runs
//!
//! Modules are processed strictly one after another on the caller's handle.
//! Bulk runs stop at the first failing module: modules before it stay
//! committed, modules after it are not attempted, and the operator re-runs
//! once the cause is fixed.

use std::path::PathBuf;
use tracing::{info, warn};

use crate::adapter::MigrationAdapter;
use crate::definitions::{
    validate_name, MigrationDirection, ModuleStatus, RunReport,
};
use crate::discovery::ModuleDiscovery;
use crate::engine::MigrationEngine;
use crate::error::{MigrationError, MigrationResult};
use crate::locator;

/// Entry point for applying and rolling back module migrations
pub struct MigrationOrchestrator<E> {
    discovery: ModuleDiscovery,
    adapter: MigrationAdapter<E>,
}

impl<E: MigrationEngine> MigrationOrchestrator<E> {
    pub fn new(modules_root: impl Into<PathBuf>, engine: E) -> Self {
        Self {
            discovery: ModuleDiscovery::new(modules_root),
            adapter: MigrationAdapter::new(engine),
        }
    }

    pub fn engine(&self) -> &E {
        self.adapter.engine()
    }

    /// Run one module's migrations in `direction` ("up" or "down").
    ///
    /// Unlike the bulk runs, a module without matching files is an error:
    /// the caller asked for this module explicitly.
    pub async fn run_for_module(
        &self,
        db: &E::Handle,
        module_name: &str,
        direction: &str,
    ) -> MigrationResult<()> {
        let direction: MigrationDirection = direction.parse()?;
        validate_name(module_name)?;

        let module = self.discovery.module(module_name);
        if !locator::has_migrations(&module, direction)? {
            return Err(MigrationError::NoMigrations {
                module: module.name,
                direction,
            });
        }

        self.adapter.run(db, &module, direction).await?;
        info!(module = %module.name, %direction, "migrations completed for module");
        Ok(())
    }

    /// Apply pending up migrations for every module, in name order
    pub async fn run_all(&self, db: &E::Handle) -> MigrationResult<RunReport> {
        let report = self.run_bulk(db, MigrationDirection::Up).await?;
        info!(
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            "all migrations applied successfully"
        );
        Ok(report)
    }

    /// Revert the latest migration of every module, in name order
    pub async fn rollback_all(&self, db: &E::Handle) -> MigrationResult<RunReport> {
        let report = self.run_bulk(db, MigrationDirection::Down).await?;
        info!(
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            "all migrations rolled back successfully"
        );
        Ok(report)
    }

    async fn run_bulk(
        &self,
        db: &E::Handle,
        direction: MigrationDirection,
    ) -> MigrationResult<RunReport> {
        let mut report = RunReport::default();

        for module in self.discovery.list_modules()? {
            if !locator::has_migrations(&module, direction)? {
                info!(module = %module.name, %direction, "no migration files found for module, skipping");
                report.skipped.push(module.name);
                continue;
            }

            if let Err(e) = self.adapter.run(db, &module, direction).await {
                warn!(
                    module = %module.name,
                    %direction,
                    completed = ?report.processed,
                    "halting migration run; later modules were not attempted"
                );
                return Err(e);
            }

            info!(module = %module.name, %direction, "migrations completed for module");
            report.processed.push(module.name);
        }

        Ok(report)
    }

    /// Per-module view of migration files against the engine's bookkeeping.
    /// Never applies or reverts anything, though the engine creates its
    /// (empty) bookkeeping table on first use.
    pub async fn status(&self, db: &E::Handle) -> MigrationResult<Vec<ModuleStatus>> {
        let mut statuses = Vec::new();

        for module in self.discovery.list_modules()? {
            let migrations = locator::migration_files(&module, MigrationDirection::Up)?;
            let current_version = if migrations.is_empty() {
                None
            } else {
                self.adapter.current_version(db, &module).await?
            };
            let pending = migrations
                .iter()
                .filter(|m| current_version.map_or(true, |current| m.version > current))
                .count();

            statuses.push(ModuleStatus {
                module: module.name,
                migrations,
                current_version,
                pending,
            });
        }

        Ok(statuses)
    }
}
