//! # autoverse-migrations: per-module schema migrations for AutoVerse
//!
//! Every installed module lives in its own directory under the modules root
//! and may carry a `migrations/` folder of timestamped `.up.sql`/`.down.sql`
//! pairs. This crate discovers those modules, checks which of them have work
//! for a direction, and hands each directory to a versioned migration engine
//! (`sqlx::migrate` by default), one module at a time.
//!
//! It also provides the scaffolder used to create new migration pairs and a
//! registry for modules that want to run programmatic migration hooks.

pub mod adapter;
pub mod definitions;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod locator;
pub mod orchestrator;
pub mod registry;
pub mod scaffold;

pub use adapter::MigrationAdapter;
pub use definitions::*;
pub use discovery::ModuleDiscovery;
pub use engine::{MigrationEngine, SqlxEngine};
pub use error::{EngineFailure, MigrationError, MigrationResult};
pub use orchestrator::MigrationOrchestrator;
pub use registry::{MigrationRegistry, ModuleMigration};
pub use scaffold::{MigrationScaffolder, ScaffoldedMigration};
