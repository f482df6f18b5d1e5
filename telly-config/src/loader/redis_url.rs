use url::Url;

use super::db_url::non_blank;
use crate::{
    ConfigLoadError, RedisConfig,
    sources::{EnvConfig, FileRedisConfig},
};

/// `REDIS_URL` wins over the discrete `REDIS_HOST`/`REDIS_PORT`/
/// `REDIS_PASSWORD`/`REDIS_DB` variables, which win over the file section.
pub fn resolve_redis(
    env: &EnvConfig,
    file_redis: Option<FileRedisConfig>,
) -> Result<Option<RedisConfig>, ConfigLoadError> {
    if let Some(url) = non_blank(env.redis_url.as_deref()) {
        return Ok(Some(RedisConfig {
            url: url.to_string(),
        }));
    }

    if let Some(host) = non_blank(env.redis_host.as_deref()) {
        let port = env.redis_port.unwrap_or(6379);
        let db = env.redis_db.unwrap_or(0);
        let mut url = Url::parse(&format!("redis://{host}:{port}/{db}"))
            .map_err(|source| ConfigLoadError::InvalidRedisUrl { source })?;
        if let Some(password) = non_blank(env.redis_password.as_deref()) {
            // Only fails for cannot-be-a-base URLs, which redis:// never is.
            let _ = url.set_password(Some(password));
        }
        return Ok(Some(RedisConfig {
            url: url.to_string(),
        }));
    }

    Ok(file_redis
        .map(|r| r.url)
        .filter(|url| !url.trim().is_empty())
        .map(|url| RedisConfig { url }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_url_from_parts() {
        let env = EnvConfig {
            redis_host: Some("cache".into()),
            redis_password: Some("pw".into()),
            redis_db: Some(2),
            ..EnvConfig::default()
        };
        let redis = resolve_redis(&env, None).unwrap().unwrap();
        assert_eq!(redis.url, "redis://:pw@cache:6379/2");
    }

    #[test]
    fn file_section_is_last_resort() {
        let file = Some(FileRedisConfig {
            url: "redis://file:6379".into(),
        });
        let redis = resolve_redis(&EnvConfig::default(), file).unwrap();
        assert_eq!(redis.unwrap().url, "redis://file:6379");
    }

    #[test]
    fn absent_everywhere_disables_cache() {
        assert!(resolve_redis(&EnvConfig::default(), None).unwrap().is_none());
    }
}
