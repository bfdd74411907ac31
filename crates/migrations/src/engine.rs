//! Schema-migration engine seam and its sqlx implementation
//!
//! The engine owns applied-version bookkeeping (the `_sqlx_migrations` table,
//! including the dirty flag left behind by an interrupted migration). Callers
//! hand it a live pool and a directory of `<version>_<description>.{up,down}.sql`
//! files; everything else happens inside `sqlx::migrate`.

use async_trait::async_trait;
use sqlx::migrate::{Migrate, MigrateError, Migrator};
use sqlx::{Database, Pool};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::Path;
use tracing::debug;

use crate::definitions::EngineOutcome;
use crate::error::EngineFailure;

/// Operations the orchestrator needs from a versioned schema-migration engine
#[async_trait]
pub trait MigrationEngine: Send + Sync {
    /// Live database handle the engine runs against
    type Handle: Send + Sync;

    /// Apply every pending up migration found in `source`
    async fn apply_forward(
        &self,
        db: &Self::Handle,
        source: &Path,
    ) -> Result<EngineOutcome, EngineFailure>;

    /// Revert the most recently applied migration found in `source`
    async fn apply_one_backward(
        &self,
        db: &Self::Handle,
        source: &Path,
    ) -> Result<EngineOutcome, EngineFailure>;

    /// Newest applied version among the migrations in `source`
    async fn current_version(
        &self,
        db: &Self::Handle,
        source: &Path,
    ) -> Result<Option<i64>, EngineFailure>;
}

/// [`MigrationEngine`] backed by `sqlx::migrate` over a `sqlx::Pool`.
///
/// Every module directory is opened as its own migrator but all of them share
/// the database's single bookkeeping table, so versions recorded by other
/// modules are ignored rather than reported as missing.
pub struct SqlxEngine<DB> {
    _database: PhantomData<fn() -> DB>,
}

impl<DB> SqlxEngine<DB>
where
    DB: Database,
    DB::Connection: Migrate,
{
    pub fn new() -> Self {
        Self {
            _database: PhantomData,
        }
    }

    async fn open(&self, source: &Path) -> Result<Migrator, MigrateError> {
        let mut migrator = Migrator::new(source).await?;
        migrator.set_ignore_missing(true);
        Ok(migrator)
    }

    /// Applied versions belonging to `migrator`, ascending.
    ///
    /// Fails if the engine has a dirty (half-applied) version recorded, or if
    /// a recorded version matches one of ours by number but not by checksum:
    /// that row belongs to another module that reused the same timestamp.
    async fn applied_versions(
        &self,
        db: &Pool<DB>,
        migrator: &Migrator,
    ) -> Result<Vec<i64>, MigrateError> {
        let mut conn = db.acquire().await?;
        conn.ensure_migrations_table().await?;
        if let Some(version) = conn.dirty_version().await? {
            return Err(MigrateError::Dirty(version));
        }

        let applied: HashMap<i64, _> = conn
            .list_applied_migrations()
            .await?
            .into_iter()
            .map(|m| (m.version, m.checksum))
            .collect();

        let mut ours = Vec::new();
        for migration in migrator.iter().filter(|m| !m.migration_type.is_down_migration()) {
            match applied.get(&migration.version) {
                Some(checksum) if *checksum != migration.checksum => {
                    return Err(MigrateError::VersionMismatch(migration.version));
                }
                Some(_) => ours.push(migration.version),
                None => {}
            }
        }
        ours.sort_unstable();
        Ok(ours)
    }
}

impl<DB> Default for SqlxEngine<DB>
where
    DB: Database,
    DB::Connection: Migrate,
{
    fn default() -> Self {
        Self::new()
    }
}

fn up_versions(migrator: &Migrator) -> impl Iterator<Item = i64> + '_ {
    migrator
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| m.version)
}

#[async_trait]
impl<DB> MigrationEngine for SqlxEngine<DB>
where
    DB: Database,
    DB::Connection: Migrate,
{
    type Handle = Pool<DB>;

    async fn apply_forward(
        &self,
        db: &Pool<DB>,
        source: &Path,
    ) -> Result<EngineOutcome, EngineFailure> {
        let migrator = self.open(source).await?;
        let applied = self.applied_versions(db, &migrator).await?;

        let mut pending: Vec<i64> = up_versions(&migrator)
            .filter(|version| applied.binary_search(version).is_err())
            .collect();
        if pending.is_empty() {
            return Ok(EngineOutcome::NoChange);
        }
        pending.sort_unstable();

        debug!(source = %source.display(), ?pending, "applying pending migrations");
        migrator.run(db).await?;
        Ok(EngineOutcome::Applied(pending))
    }

    async fn apply_one_backward(
        &self,
        db: &Pool<DB>,
        source: &Path,
    ) -> Result<EngineOutcome, EngineFailure> {
        let migrator = self.open(source).await?;
        let mut applied = self.applied_versions(db, &migrator).await?;

        let Some(latest) = applied.pop() else {
            return Ok(EngineOutcome::NoChange);
        };
        let reversible = migrator
            .iter()
            .any(|m| m.version == latest && m.migration_type.is_down_migration());
        if !reversible {
            return Err(format!(
                "migration {} in {} has no down script",
                latest,
                source.display()
            )
            .into());
        }
        // Undo everything above the previous version of this directory, i.e.
        // exactly `latest`.
        let target = applied.last().copied().unwrap_or(0);

        debug!(source = %source.display(), latest, target, "reverting latest migration");
        migrator.undo(db, target).await?;
        Ok(EngineOutcome::Applied(vec![latest]))
    }

    async fn current_version(
        &self,
        db: &Pool<DB>,
        source: &Path,
    ) -> Result<Option<i64>, EngineFailure> {
        let migrator = self.open(source).await?;
        let applied = self.applied_versions(db, &migrator).await?;
        Ok(applied.last().copied())
    }
}
