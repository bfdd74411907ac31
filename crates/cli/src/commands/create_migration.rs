use autoverse_core::{AppConfig, CoreError};
use autoverse_migrations::MigrationScaffolder;

use super::migration_error;

pub fn create(config: &AppConfig, module: &str, description: &str) -> Result<(), CoreError> {
    let created = MigrationScaffolder::new(&config.modules_root)
        .create_migration(module, description)
        .map_err(migration_error)?;

    println!("Created migration files:");
    println!("  {}", created.up_path.display());
    println!("  {}", created.down_path.display());
    Ok(())
}
