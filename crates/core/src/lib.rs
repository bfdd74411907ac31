pub mod config;
pub mod errors;
pub mod logging;

pub use config::{
    AppConfig, AppConfigTrait, ConfigError, ConfigSource, DatabaseConfig, Environment, LogFormat,
};
pub use errors::{CoreError, CoreResult};
pub use logging::{init_logging, LoggingConfig};
