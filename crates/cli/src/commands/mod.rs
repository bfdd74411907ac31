pub mod create_migration;
pub mod database;
pub mod migrate;

use autoverse_core::CoreError;
use autoverse_migrations::MigrationError;

/// Lift a migration failure into the core error used at the CLI boundary
pub(crate) fn migration_error(e: MigrationError) -> CoreError {
    CoreError::migration_with_source(e.to_string(), e)
}
