use std::path::PathBuf;
use std::time::Duration;

use url::Url;

pub const DEFAULT_ORIGIN_PREFIX: &str = "https://api.themoviedb.org/3";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub cache: CacheConfig,
    pub origin: OriginConfig,
    pub ingest: IngestConfig,
    pub cors: CorsConfig,
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub primary_url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Response cache tuning. Applies regardless of the backend in use.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_ttl: Duration,
    pub command_timeout: Duration,
    pub connect_timeout: Duration,
    pub connect_retries: u32,
    pub retry_backoff_step: Duration,
    pub retry_backoff_cap: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            command_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(1),
            connect_retries: 3,
            retry_backoff_step: Duration::from_millis(200),
            retry_backoff_cap: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OriginConfig {
    pub base_url: Url,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Pause before each show detail request.
    pub show_delay: Duration,
    /// Pause after each season detail request.
    pub season_delay: Duration,
    /// Import shows served through the origin fallback in the background.
    pub persist_on_fallback: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            show_delay: Duration::from_millis(1000),
            season_delay: Duration::from_millis(500),
            persist_on_fallback: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
}

impl CorsConfig {
    pub fn is_wildcard_included(&self) -> bool {
        self.allowed_origins
            .iter()
            .any(|origin| origin.trim() == "*")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
