//! Modules shipped with the application and their migration hooks

mod auth;
mod users;

use autoverse_migrations::MigrationRegistry;

pub use auth::AuthMigration;
pub use users::UsersMigration;

/// Register the migration hooks of every built-in module, in load order
pub fn register_all<H>(registry: &MigrationRegistry<H>)
where
    H: Sync + 'static,
{
    registry.register(UsersMigration);
    registry.register(AuthMigration);
}
