//! Migration Engine Adapter
//!
//! Runs one module's migration directory through the engine. "Nothing to do"
//! is reported as success; every other engine failure is wrapped with the
//! module and direction and surfaced without retrying, since the engine's
//! dirty-state tracking makes blind retries after a partial failure unsafe.

use tracing::{debug, info};

use crate::definitions::{EngineOutcome, MigrationDirection, Module};
use crate::engine::MigrationEngine;
use crate::error::{MigrationError, MigrationResult};

pub struct MigrationAdapter<E> {
    engine: E,
}

impl<E: MigrationEngine> MigrationAdapter<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Apply all pending up migrations of `module`
    pub async fn apply(&self, db: &E::Handle, module: &Module) -> MigrationResult<()> {
        self.run(db, module, MigrationDirection::Up).await
    }

    /// Revert the most recent migration of `module`
    pub async fn rollback(&self, db: &E::Handle, module: &Module) -> MigrationResult<()> {
        self.run(db, module, MigrationDirection::Down).await
    }

    pub async fn run(
        &self,
        db: &E::Handle,
        module: &Module,
        direction: MigrationDirection,
    ) -> MigrationResult<()> {
        let dir = module.migrations_dir.as_path();
        let outcome = match direction {
            MigrationDirection::Up => self.engine.apply_forward(db, dir).await,
            MigrationDirection::Down => self.engine.apply_one_backward(db, dir).await,
        }
        .map_err(|source| MigrationError::Engine {
            module: module.name.clone(),
            direction,
            source,
        })?;

        match outcome {
            EngineOutcome::NoChange => {
                debug!(module = %module.name, %direction, "no migration changes pending");
            }
            EngineOutcome::Applied(versions) => {
                info!(module = %module.name, %direction, ?versions, "migration versions changed");
            }
        }
        Ok(())
    }

    /// Engine-reported current version of `module`
    pub async fn current_version(
        &self,
        db: &E::Handle,
        module: &Module,
    ) -> MigrationResult<Option<i64>> {
        self.engine
            .current_version(db, &module.migrations_dir)
            .await
            .map_err(|source| MigrationError::Status {
                module: module.name.clone(),
                source,
            })
    }
}
