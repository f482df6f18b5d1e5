pub mod db_url;
pub mod error;
pub mod redis_url;

use once_cell::sync::Lazy;
use std::{fs, path::PathBuf, time::Duration};
use url::Url;

use crate::{
    models::{
        CacheConfig, Config, ConfigMetadata, CorsConfig, DatabaseConfig,
        DEFAULT_ORIGIN_PREFIX, IngestConfig, OriginConfig, ServerConfig,
    },
    sources::{EnvConfig, FileConfig},
    validation::{self, ConfigWarnings},
};
pub use error::ConfigLoadError;

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![PathBuf::from("telly.toml"), PathBuf::from("config/telly.toml")]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let env_config = EnvConfig::gather();
        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let mut warnings = ConfigWarnings::default();
        if file_config.is_none() {
            warnings.push("No telly.toml detected; using environment variables only");
        }

        let mut config = compose(file_config.unwrap_or_default(), env_config)?;
        config.metadata = ConfigMetadata {
            config_path,
            env_file_loaded,
        };
        warnings.extend(validation::collect_warnings(&config));

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        // An explicitly named file must exist; default locations are optional.
        let (path, required) = if let Some(explicit) = &self.options.config_path {
            (explicit.clone(), true)
        } else if let Some(from_env) = &env_config.config_path {
            (from_env.clone(), true)
        } else {
            match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
            {
                Some(found) => (found.clone(), false),
                None => return Ok((None, None)),
            }
        };

        if !path.exists() {
            if required {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents =
            fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
                path: path.clone(),
                source: err,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

/// Merge file and environment sources. Environment values take precedence.
pub fn compose(file: FileConfig, env: EnvConfig) -> Result<Config, ConfigLoadError> {
    let FileConfig {
        server: file_server,
        database: file_database,
        redis: file_redis,
        cache: file_cache,
        origin: file_origin,
        ingest: file_ingest,
        cors: file_cors,
        dev_mode: file_dev_mode,
    } = file;

    let server = ServerConfig {
        host: env
            .server_host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| "0.0.0.0".to_string()),
        port: env.server_port.or(file_server.port).unwrap_or(3000),
    };

    let database = DatabaseConfig {
        primary_url: db_url::resolve_database_url(&env, &file_database)?,
        max_connections: env
            .database_max_connections
            .or(file_database.max_connections)
            .unwrap_or(10),
    };

    let redis = redis_url::resolve_redis(&env, file_redis)?;

    let defaults = CacheConfig::default();
    let cache = CacheConfig {
        default_ttl: duration(
            "CACHE_DEFAULT_TTL",
            env.cache_default_ttl.as_ref().or(file_cache.default_ttl.as_ref()),
            defaults.default_ttl,
        )?,
        command_timeout: duration(
            "CACHE_COMMAND_TIMEOUT",
            env.cache_command_timeout
                .as_ref()
                .or(file_cache.command_timeout.as_ref()),
            defaults.command_timeout,
        )?,
        connect_timeout: duration(
            "CACHE_CONNECT_TIMEOUT",
            env.cache_connect_timeout
                .as_ref()
                .or(file_cache.connect_timeout.as_ref()),
            defaults.connect_timeout,
        )?,
        connect_retries: env
            .cache_connect_retries
            .or(file_cache.connect_retries)
            .unwrap_or(defaults.connect_retries),
        ..defaults
    };

    let raw_prefix = env
        .tmdb_api_prefix
        .clone()
        .or(file_origin.base_url)
        .unwrap_or_else(|| DEFAULT_ORIGIN_PREFIX.to_string());
    let base_url = Url::parse(raw_prefix.trim()).map_err(|source| {
        ConfigLoadError::InvalidOriginUrl {
            value: raw_prefix.clone(),
            source,
        }
    })?;
    let origin = OriginConfig {
        base_url,
        api_key: env
            .tmdb_api_key
            .clone()
            .or(file_origin.api_key)
            .filter(|key| !key.trim().is_empty()),
        timeout: duration(
            "ORIGIN_TIMEOUT",
            env.origin_timeout.as_ref().or(file_origin.timeout.as_ref()),
            Duration::from_secs(10),
        )?,
    };

    let ingest_defaults = IngestConfig::default();
    let ingest = IngestConfig {
        show_delay: duration(
            "INGEST_SHOW_DELAY",
            env.ingest_show_delay.as_ref().or(file_ingest.show_delay.as_ref()),
            ingest_defaults.show_delay,
        )?,
        season_delay: duration(
            "INGEST_SEASON_DELAY",
            env.ingest_season_delay
                .as_ref()
                .or(file_ingest.season_delay.as_ref()),
            ingest_defaults.season_delay,
        )?,
        persist_on_fallback: env
            .fallback_persist
            .or(file_ingest.persist_on_fallback)
            .unwrap_or(false),
    };

    let cors = CorsConfig {
        allowed_origins: env
            .cors_allowed_origins
            .clone()
            .or(file_cors.allowed_origins)
            .unwrap_or_else(default_cors_origins),
        allowed_methods: env
            .cors_allowed_methods
            .clone()
            .or(file_cors.allowed_methods)
            .unwrap_or_else(default_cors_methods),
        allowed_headers: env
            .cors_allowed_headers
            .clone()
            .or(file_cors.allowed_headers)
            .unwrap_or_else(default_cors_headers),
    };

    Ok(Config {
        server,
        database,
        redis,
        cache,
        origin,
        ingest,
        cors,
        dev_mode: env.dev_mode.or(file_dev_mode).unwrap_or(false),
        metadata: ConfigMetadata::default(),
    })
}

fn duration(
    key: &'static str,
    raw: Option<&String>,
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    match raw.map(|value| value.trim()).filter(|value| !value.is_empty()) {
        None => Ok(default),
        Some(value) => humantime::parse_duration(value).map_err(|source| {
            ConfigLoadError::InvalidDuration {
                key,
                value: value.to_string(),
                source,
            }
        }),
    }
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:5173".to_string(),
        "http://localhost:8080".to_string(),
    ]
}

fn default_cors_methods() -> Vec<String> {
    vec![
        "GET".to_string(),
        "POST".to_string(),
        "DELETE".to_string(),
        "OPTIONS".to_string(),
    ]
}

fn default_cors_headers() -> Vec<String> {
    vec!["Content-Type".to_string(), "Accept".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_without_any_source() {
        let config = compose(FileConfig::default(), EnvConfig::default()).unwrap();

        assert_eq!(config.server.port, 3000);
        assert!(config.redis.is_none());
        assert_eq!(config.cache.default_ttl, Duration::from_secs(3600));
        assert_eq!(config.cache.connect_retries, 3);
        assert_eq!(config.origin.base_url.as_str(), "https://api.themoviedb.org/3");
        assert_eq!(config.ingest.show_delay, Duration::from_secs(1));
        assert_eq!(config.ingest.season_delay, Duration::from_millis(500));
        assert!(!config.ingest.persist_on_fallback);
    }

    #[test]
    fn environment_overrides_file() {
        let file: FileConfig = toml::from_str(
            r#"
            [server]
            port = 8081

            [cache]
            default_ttl = "10m"

            [origin]
            api_key = "from-file"
            "#,
        )
        .unwrap();
        let env = EnvConfig {
            server_port: Some(9090),
            tmdb_api_key: Some("from-env".into()),
            ..EnvConfig::default()
        };

        let config = compose(file, env).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.cache.default_ttl, Duration::from_secs(600));
        assert_eq!(config.origin.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn rejects_garbage_durations() {
        let env = EnvConfig {
            cache_command_timeout: Some("soon".into()),
            ..EnvConfig::default()
        };
        let err = compose(FileConfig::default(), env).unwrap_err();
        assert!(matches!(
            err,
            ConfigLoadError::InvalidDuration { key: "CACHE_COMMAND_TIMEOUT", .. }
        ));
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ingest]\nshow_delay = \"2s\"\npersist_on_fallback = true").unwrap();

        let loader = ConfigLoader::new().with_config_path(file.path());
        let (parsed, path) = loader.load_file_config(&EnvConfig::default()).unwrap();

        let parsed = parsed.expect("file parsed");
        assert_eq!(parsed.ingest.show_delay.as_deref(), Some("2s"));
        assert_eq!(parsed.ingest.persist_on_fallback, Some(true));
        assert_eq!(path.as_deref(), Some(file.path()));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let loader = ConfigLoader::new().with_config_path("/definitely/not/here.toml");
        let err = loader.load_file_config(&EnvConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));
    }
}
