use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::util::{parse_bool_var, parse_csv_var, parse_var};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    pub redis: Option<FileRedisConfig>,
    #[serde(default)]
    pub cache: FileCacheConfig,
    #[serde(default)]
    pub origin: FileOriginConfig,
    #[serde(default)]
    pub ingest: FileIngestConfig,
    #[serde(default)]
    pub cors: FileCorsConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileRedisConfig {
    pub url: String,
}

/// Durations are humantime strings such as `"1h"` or `"250ms"`.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCacheConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_ttl: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_retries: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileOriginConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileIngestConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_delay: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_delay: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_on_fallback: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCorsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_methods: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_headers: Option<Vec<String>>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub database_url: Option<String>,
    pub database_url_file: Option<PathBuf>,
    pub database_host: Option<String>,
    pub database_port: Option<u16>,
    pub database_user: Option<String>,
    pub database_name: Option<String>,
    pub database_password: Option<String>,
    pub database_password_file: Option<PathBuf>,
    pub database_max_connections: Option<u32>,
    pub redis_url: Option<String>,
    pub redis_host: Option<String>,
    pub redis_port: Option<u16>,
    pub redis_password: Option<String>,
    pub redis_db: Option<u32>,
    pub cache_default_ttl: Option<String>,
    pub cache_command_timeout: Option<String>,
    pub cache_connect_timeout: Option<String>,
    pub cache_connect_retries: Option<u32>,
    pub tmdb_api_key: Option<String>,
    pub tmdb_api_prefix: Option<String>,
    pub origin_timeout: Option<String>,
    pub ingest_show_delay: Option<String>,
    pub ingest_season_delay: Option<String>,
    pub fallback_persist: Option<bool>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub cors_allowed_methods: Option<Vec<String>>,
    pub cors_allowed_headers: Option<Vec<String>>,
    pub dev_mode: Option<bool>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            config_path: std::env::var("TELLY_CONFIG_PATH").ok().map(PathBuf::from),
            server_host: std::env::var("SERVER_HOST").ok(),
            server_port: parse_var("SERVER_PORT"),
            database_url: std::env::var("DATABASE_URL").ok(),
            database_url_file: std::env::var("DATABASE_URL_FILE")
                .ok()
                .map(PathBuf::from),
            database_host: std::env::var("DATABASE_HOST").ok(),
            database_port: parse_var("DATABASE_PORT"),
            database_user: std::env::var("DATABASE_USER").ok(),
            database_name: std::env::var("DATABASE_NAME").ok(),
            database_password: std::env::var("DATABASE_PASSWORD").ok(),
            database_password_file: std::env::var("DATABASE_PASSWORD_FILE")
                .ok()
                .map(PathBuf::from),
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS"),

            redis_url: std::env::var("REDIS_URL").ok(),
            redis_host: std::env::var("REDIS_HOST").ok(),
            redis_port: parse_var("REDIS_PORT"),
            redis_password: std::env::var("REDIS_PASSWORD").ok(),
            redis_db: parse_var("REDIS_DB"),

            cache_default_ttl: std::env::var("CACHE_DEFAULT_TTL").ok(),
            cache_command_timeout: std::env::var("CACHE_COMMAND_TIMEOUT").ok(),
            cache_connect_timeout: std::env::var("CACHE_CONNECT_TIMEOUT").ok(),
            cache_connect_retries: parse_var("CACHE_CONNECT_RETRIES"),

            tmdb_api_key: std::env::var("TMDB_API_KEY").ok(),
            tmdb_api_prefix: std::env::var("TMDB_API_PREFIX").ok(),
            origin_timeout: std::env::var("ORIGIN_TIMEOUT").ok(),

            ingest_show_delay: std::env::var("INGEST_SHOW_DELAY").ok(),
            ingest_season_delay: std::env::var("INGEST_SEASON_DELAY").ok(),
            fallback_persist: parse_bool_var("FALLBACK_PERSIST"),

            cors_allowed_origins: parse_csv_var("CORS_ALLOWED_ORIGINS"),
            cors_allowed_methods: parse_csv_var("CORS_ALLOWED_METHODS"),
            cors_allowed_headers: parse_csv_var("CORS_ALLOWED_HEADERS"),

            dev_mode: parse_bool_var("DEV_MODE"),
        }
    }
}
