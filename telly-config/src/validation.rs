use crate::models::Config;

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

/// Non-fatal checks on a composed configuration.
pub fn collect_warnings(config: &Config) -> ConfigWarnings {
    let mut warnings = ConfigWarnings::default();

    if config.redis.is_none() {
        warnings.push_with_hint(
            "REDIS_URL not configured; response caching is disabled",
            "Set REDIS_URL or REDIS_HOST to enable the read-through cache",
        );
    }

    if config.origin.api_key.is_none() {
        warnings.push_with_hint(
            "TMDB_API_KEY not configured; origin requests will be rejected upstream",
            "Set TMDB_API_KEY to enable origin fallback and ingestion",
        );
    }

    if config.database.primary_url.is_none() {
        warnings.push_with_hint(
            "No database URL configured",
            "Set DATABASE_URL or DATABASE_HOST/DATABASE_USER/DATABASE_NAME",
        );
    }

    if !config.dev_mode && config.cors.is_wildcard_included() {
        warnings.push_with_hint(
            "CORS_ALLOWED_ORIGINS contains a wildcard outside dev mode",
            "List explicit origins or set DEV_MODE=true",
        );
    }

    if config.cache.command_timeout > std::time::Duration::from_secs(5) {
        warnings.push(
            "CACHE_COMMAND_TIMEOUT above 5s delays requests whenever the cache stalls",
        );
    }

    warnings
}
