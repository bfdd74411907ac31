use async_trait::async_trait;
use autoverse_migrations::{EngineFailure, ModuleMigration};
use tracing::debug;

/// Users module. Its schema lives entirely in `Modules/users/migrations`.
pub struct UsersMigration;

#[async_trait]
impl<H> ModuleMigration<H> for UsersMigration
where
    H: Sync + 'static,
{
    fn module(&self) -> &str {
        "users"
    }

    async fn migrate(&self, _db: &H) -> Result<(), EngineFailure> {
        debug!("users module has no programmatic migrations");
        Ok(())
    }
}
