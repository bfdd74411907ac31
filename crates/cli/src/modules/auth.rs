use async_trait::async_trait;
use autoverse_migrations::{EngineFailure, ModuleMigration};
use tracing::debug;

pub struct AuthMigration;

#[async_trait]
impl<H> ModuleMigration<H> for AuthMigration
where
    H: Sync + 'static,
{
    fn module(&self) -> &str {
        "auth"
    }

    async fn migrate(&self, _db: &H) -> Result<(), EngineFailure> {
        debug!("auth module has no programmatic migrations");
        Ok(())
    }
}
