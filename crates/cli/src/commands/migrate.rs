use std::fmt::Write as _;
use std::path::Path;

use autoverse_core::{AppConfig, CoreError};
use autoverse_migrations::{
    MigrationDirection, MigrationOrchestrator, MigrationRegistry, ModuleStatus, RunReport,
    SqlxEngine,
};
use serde::Serialize;
use sqlx::{PgPool, Postgres};

use super::migration_error;
use crate::modules;

fn orchestrator(config: &AppConfig) -> MigrationOrchestrator<SqlxEngine<Postgres>> {
    MigrationOrchestrator::new(&config.modules_root, SqlxEngine::new())
}

pub async fn up(pool: &PgPool, config: &AppConfig, module: Option<&str>) -> Result<(), CoreError> {
    run(pool, config, module, MigrationDirection::Up).await
}

pub async fn down(pool: &PgPool, config: &AppConfig, module: Option<&str>) -> Result<(), CoreError> {
    run(pool, config, module, MigrationDirection::Down).await
}

async fn run(
    pool: &PgPool,
    config: &AppConfig,
    module: Option<&str>,
    direction: MigrationDirection,
) -> Result<(), CoreError> {
    let orchestrator = orchestrator(config);

    match module {
        Some(name) => {
            orchestrator
                .run_for_module(pool, name, direction.as_str())
                .await
                .map_err(migration_error)?;
            println!("✅ {}: {} migrations completed", name, direction);
        }
        None => {
            let report = match direction {
                MigrationDirection::Up => orchestrator.run_all(pool).await,
                MigrationDirection::Down => orchestrator.rollback_all(pool).await,
            }
            .map_err(migration_error)?;
            print!("{}", render_report(&report, direction));
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct StatusReport<'a> {
    modules_root: &'a Path,
    modules: &'a [ModuleStatus],
}

pub async fn status(pool: &PgPool, config: &AppConfig, json: bool) -> Result<(), CoreError> {
    let statuses = orchestrator(config)
        .status(pool)
        .await
        .map_err(migration_error)?;

    if json {
        let report = StatusReport {
            modules_root: &config.modules_root,
            modules: &statuses,
        };
        let output = serde_json::to_string_pretty(&report)
            .map_err(|e| CoreError::migration_with_source("failed to encode migration status", e))?;
        println!("{}", output);
    } else {
        print!("{}", render_status(&statuses));
    }
    Ok(())
}

/// Run the callbacks modules registered at startup
pub async fn hooks(pool: &PgPool) -> Result<(), CoreError> {
    let registry = MigrationRegistry::new();
    modules::register_all(&registry);

    let count = registry.run_registered(pool).await.map_err(migration_error)?;
    println!("✅ Ran {} module migration hook(s)", count);
    Ok(())
}

fn render_report(report: &RunReport, direction: MigrationDirection) -> String {
    let mut out = String::new();
    for module in &report.processed {
        let _ = writeln!(out, "✅ {}: {} migrations completed", module, direction);
    }
    for module in &report.skipped {
        let _ = writeln!(out, "⏭️  {}: no {} migrations", module, direction);
    }
    if report.processed.is_empty() && report.skipped.is_empty() {
        let _ = writeln!(out, "No modules found");
    }
    out
}

fn render_status(statuses: &[ModuleStatus]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Migration Status:");
    let _ = writeln!(out, "================");

    if statuses.is_empty() {
        let _ = writeln!(out, "No modules found");
        return out;
    }

    for status in statuses {
        if status.migrations.is_empty() {
            let _ = writeln!(out, "{}: no migrations", status.module);
            continue;
        }

        let version = status
            .current_version
            .map(|v| v.to_string())
            .unwrap_or_else(|| "none".to_string());
        let _ = writeln!(
            out,
            "{}: version {}, {} pending",
            status.module, version, status.pending
        );
        for migration in &status.migrations {
            let applied = status.current_version.map_or(false, |v| migration.version <= v);
            let _ = writeln!(
                out,
                "  {} {}_{}",
                if applied { "✅" } else { "⏳" },
                migration.version,
                migration.description
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoverse_migrations::MigrationFile;
    use std::path::PathBuf;

    fn file(version: i64, description: &str) -> MigrationFile {
        MigrationFile {
            version,
            description: description.to_string(),
            direction: MigrationDirection::Up,
            path: PathBuf::from(format!("Modules/users/migrations/{}_{}.up.sql", version, description)),
        }
    }

    #[test]
    fn test_render_status_marks_applied_and_pending() {
        let statuses = vec![
            ModuleStatus {
                module: "auth".to_string(),
                migrations: Vec::new(),
                current_version: None,
                pending: 0,
            },
            ModuleStatus {
                module: "users".to_string(),
                migrations: vec![
                    file(20240101000000, "create_users"),
                    file(20240102000000, "add_email"),
                ],
                current_version: Some(20240101000000),
                pending: 1,
            },
        ];

        let rendered = render_status(&statuses);
        assert!(rendered.contains("auth: no migrations\n"));
        assert!(rendered.contains("users: version 20240101000000, 1 pending\n"));
        assert!(rendered.contains("  ✅ 20240101000000_create_users\n"));
        assert!(rendered.contains("  ⏳ 20240102000000_add_email\n"));
    }

    #[test]
    fn test_render_report_lists_processed_and_skipped() {
        let report = RunReport {
            processed: vec!["users".to_string()],
            skipped: vec!["auth".to_string()],
        };

        let rendered = render_report(&report, MigrationDirection::Down);
        assert_eq!(
            rendered,
            "✅ users: down migrations completed\n⏭️  auth: no down migrations\n"
        );
        assert_eq!(
            render_report(&RunReport::default(), MigrationDirection::Up),
            "No modules found\n"
        );
    }

    #[test]
    fn test_status_report_json_shape() {
        let statuses = vec![ModuleStatus {
            module: "users".to_string(),
            migrations: vec![file(20240101000000, "create_users")],
            current_version: Some(20240101000000),
            pending: 0,
        }];
        let report = StatusReport {
            modules_root: Path::new("Modules"),
            modules: &statuses,
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["modules_root"], "Modules");
        assert_eq!(value["modules"][0]["module"], "users");
        assert_eq!(value["modules"][0]["current_version"], 20240101000000i64);
        assert_eq!(value["modules"][0]["migrations"][0]["direction"], "up");
    }
}
