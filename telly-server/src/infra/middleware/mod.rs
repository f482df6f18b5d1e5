pub mod origin_fallback;
pub mod response_cache;

pub use origin_fallback::{OriginFallback, ResponseCommitted, origin_fallback};
pub use response_cache::{
    CacheName, CachePolicy, ResponseCacheState, X_CACHE, X_CACHE_KEY,
    response_cache,
};
