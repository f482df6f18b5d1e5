//! Configuration library for telly.
//!
//! Values are layered as `.env` file, process environment, an optional TOML
//! file and finally built-in defaults. The server binary applies CLI overrides
//! on top of the returned [`Config`].

pub mod loader;
pub mod models;
pub mod sources;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError};
pub use models::{
    CacheConfig, Config, ConfigMetadata, CorsConfig, DatabaseConfig,
    IngestConfig, OriginConfig, RedisConfig, ServerConfig,
};
pub use validation::{ConfigWarning, ConfigWarnings};
