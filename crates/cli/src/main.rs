mod commands;
mod modules;

use std::path::PathBuf;
use std::process::ExitCode;

use autoverse_core::{init_logging, AppConfig, AppConfigTrait, CoreError, LoggingConfig};
use clap::{Parser, Subcommand};
use commands::*;
use tracing::error;

#[derive(Parser)]
#[command(name = "autoverse")]
#[command(about = "Per-module database migrations for AutoVerse applications")]
#[command(version)]
struct Cli {
    /// Directory containing the installed modules (overrides MODULES_ROOT)
    #[arg(long, global = true)]
    modules_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply, roll back or inspect module migrations
    Migrate {
        #[command(subcommand)]
        migrate_command: MigrateCommands,
    },

    /// Create a new up/down migration pair for a module
    CreateMigration {
        /// Module the migration belongs to
        module_name: String,

        /// Short description, used in the file names and as the table name
        migration_description: String,
    },
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Apply pending migrations
    Up {
        /// Only migrate this module
        #[arg(long)]
        module: Option<String>,
    },

    /// Roll back the latest migration
    Down {
        /// Only roll back this module
        #[arg(long)]
        module: Option<String>,
    },

    /// Show migration status per module
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the programmatic migration hooks registered by modules
    Hooks,
}

fn load_config(modules_root: Option<PathBuf>) -> Result<AppConfig, CoreError> {
    let mut config = AppConfig::load()?;
    if let Some(root) = modules_root {
        config.modules_root = root;
        config.validate()?;
    }
    Ok(config)
}

async fn run(command: Commands, config: &AppConfig) -> Result<(), CoreError> {
    match command {
        Commands::Migrate { migrate_command } => {
            let pool = database::connect(config).await?;
            match migrate_command {
                MigrateCommands::Up { module } => {
                    migrate::up(&pool, config, module.as_deref()).await?;
                }
                MigrateCommands::Down { module } => {
                    migrate::down(&pool, config, module.as_deref()).await?;
                }
                MigrateCommands::Status { json } => {
                    migrate::status(&pool, config, json).await?;
                }
                MigrateCommands::Hooks => {
                    migrate::hooks(&pool).await?;
                }
            }
            pool.close().await;
        }
        Commands::CreateMigration {
            module_name,
            migration_description,
        } => {
            create_migration::create(config, &module_name, &migration_description)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.modules_root) {
        Ok(config) => config,
        Err(e) => {
            let _ = init_logging(LoggingConfig::default());
            error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(LoggingConfig::from_app_config(&config).with_service("autoverse")) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_migrate_commands() {
        let cli = Cli::try_parse_from(["autoverse", "migrate", "up", "--module", "users"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Migrate {
                migrate_command: MigrateCommands::Up { module: Some(ref m) }
            } if m == "users"
        ));

        let cli = Cli::try_parse_from(["autoverse", "migrate", "down"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Migrate {
                migrate_command: MigrateCommands::Down { module: None }
            }
        ));

        let cli = Cli::try_parse_from(["autoverse", "migrate", "status", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Migrate {
                migrate_command: MigrateCommands::Status { json: true }
            }
        ));
    }

    #[test]
    fn test_parses_create_migration_with_global_root() {
        let cli = Cli::try_parse_from([
            "autoverse",
            "create-migration",
            "widgets",
            "add_price",
            "--modules-root",
            "app/Modules",
        ])
        .unwrap();

        assert_eq!(cli.modules_root, Some(PathBuf::from("app/Modules")));
        match cli.command {
            Commands::CreateMigration {
                module_name,
                migration_description,
            } => {
                assert_eq!(module_name, "widgets");
                assert_eq!(migration_description, "add_price");
            }
            _ => panic!("expected create-migration"),
        }
    }

    #[test]
    fn test_create_migration_requires_both_arguments() {
        assert!(Cli::try_parse_from(["autoverse", "create-migration", "widgets"]).is_err());
        assert!(Cli::try_parse_from(["autoverse", "migrate", "sideways"]).is_err());
    }
}
