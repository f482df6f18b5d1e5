//! Read-through response cache.
//!
//! Attached per route with a [`CachePolicy`]; routes without a policy are
//! never cached. A hit answers straight from the cache store and the wrapped
//! handler does not run. A miss runs the handler and stores a successful JSON
//! object or array in the background, so a slow or broken cache never delays
//! the response.
//!
//! When the cache store is unavailable the layer steps aside entirely: no
//! lookup, no write and no `X-Cache` headers.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::{
    Json,
    body::{Body, to_bytes},
    extract::{FromRequestParts, Query, RawPathParams, Request, State},
    http::{HeaderName, HeaderValue, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::{debug, warn};

use telly_core::{CacheKeys, CacheStore};

use super::origin_fallback::OriginFallback;

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");
pub const X_CACHE_KEY: HeaderName = HeaderName::from_static("x-cache-key");

/// Logical cache name: a fixed string or derived from the path parameters.
#[derive(Debug, Clone, Copy)]
pub enum CacheName {
    Fixed(&'static str),
    Derived(fn(&BTreeMap<String, String>) -> String),
}

#[derive(Debug, Clone)]
pub struct CachePolicy {
    operation: &'static str,
    name: Option<CacheName>,
    ttl: Option<Duration>,
    warm: bool,
}

impl CachePolicy {
    /// Cache under `operation` with the store's default TTL.
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            name: None,
            ttl: None,
            warm: false,
        }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(CacheName::Fixed(name));
        self
    }

    pub fn derived(mut self, name: fn(&BTreeMap<String, String>) -> String) -> Self {
        self.name = Some(CacheName::Derived(name));
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Request this route once at startup so the first caller gets a hit.
    pub fn warmed(mut self) -> Self {
        self.warm = true;
        self
    }

    pub fn is_warm(&self) -> bool {
        self.warm
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn key(
        &self,
        params: &BTreeMap<String, String>,
        query: &BTreeMap<String, String>,
    ) -> String {
        let name = match self.name {
            Some(CacheName::Fixed(name)) => name.to_string(),
            Some(CacheName::Derived(derive)) => derive(params),
            None => self.operation.to_string(),
        };
        CacheKeys::response(&name, params, query)
    }
}

#[derive(Debug, Clone)]
pub struct ResponseCacheState {
    cache: CacheStore,
    policy: CachePolicy,
}

impl ResponseCacheState {
    pub fn new(cache: CacheStore, policy: CachePolicy) -> Self {
        Self { cache, policy }
    }
}

pub async fn response_cache(
    State(layer): State<ResponseCacheState>,
    request: Request,
    next: Next,
) -> Response {
    let ResponseCacheState { cache, policy } = layer;
    if !cache.is_available() {
        return next.run(request).await;
    }

    let (mut parts, body) = request.into_parts();
    let key = request_key(&policy, &mut parts).await;

    if let Some(cached) = cache.get_json::<Value>(&key).await {
        debug!("Serving cached response for {}", key);
        let mut response = Json(cached).into_response();
        tag(&mut response, "HIT", &key);
        return response;
    }

    let response = next.run(Request::from_parts(parts, body)).await;
    let mut response = store_on_success(&cache, &policy, &key, response).await;
    tag(&mut response, "MISS", &key);
    response
}

async fn request_key(policy: &CachePolicy, parts: &mut Parts) -> String {
    let params: BTreeMap<String, String> =
        match RawPathParams::from_request_parts(parts, &()).await {
            Ok(raw) => raw
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            Err(_) => BTreeMap::new(),
        };
    let query = Query::<BTreeMap<String, String>>::try_from_uri(&parts.uri)
        .map(|Query(query)| query)
        .unwrap_or_default();
    policy.key(&params, &query)
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Buffers a cacheable response, schedules the write and hands back an
/// equivalent response. Anything else is returned untouched.
async fn store_on_success(
    cache: &CacheStore,
    policy: &CachePolicy,
    key: &str,
    response: Response,
) -> Response {
    if !response.status().is_success()
        || response.extensions().get::<OriginFallback>().is_some()
        || !is_json(&response)
    {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("Failed to buffer response for {}: {}", key, err);
            return Response::from_parts(parts, Body::empty());
        }
    };

    if let Ok(value) = serde_json::from_slice::<Value>(&bytes)
        && (value.is_object() || value.is_array())
    {
        let cache = cache.clone();
        let key = key.to_string();
        let ttl = policy.ttl();
        tokio::spawn(async move {
            if cache.set_json(&key, &value, ttl).await {
                debug!("Cached: {}", key);
            }
        });
    }

    Response::from_parts(parts, Body::from(bytes))
}

fn tag(response: &mut Response, status: &'static str, key: &str) {
    let headers = response.headers_mut();
    headers.insert(X_CACHE, HeaderValue::from_static(status));
    if let Ok(value) = HeaderValue::from_str(key) {
        headers.insert(X_CACHE_KEY, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn key_defaults_to_operation_name() {
        let policy = CachePolicy::new("tv.show");
        assert_eq!(
            policy.key(&map(&[("id", "1396")]), &BTreeMap::new()),
            r#"cache:tv.show:{"id":"1396"}"#
        );
    }

    #[test]
    fn fixed_and_derived_names_override_operation() {
        let fixed = CachePolicy::new("trending.tv_day").named("trending");
        assert_eq!(
            fixed.key(&BTreeMap::new(), &map(&[("page", "2")])),
            r#"cache:trending:{"page":"2"}"#
        );

        let derived = CachePolicy::new("tv.season").derived(|params| {
            format!("show-{}-seasons", params.get("id").map(String::as_str).unwrap_or("?"))
        });
        assert!(
            derived
                .key(&map(&[("id", "7")]), &BTreeMap::new())
                .starts_with("cache:show-7-seasons:")
        );
    }

    #[test]
    fn only_json_responses_are_candidates() {
        let json = Json(serde_json::json!({"a": 1})).into_response();
        assert!(is_json(&json));
        let text = "plain".into_response();
        assert!(!is_json(&text));
    }
}
