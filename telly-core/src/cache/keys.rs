use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
pub struct CacheKeys;

impl CacheKeys {
    /// `cache:{name}[:{params}][:{query}]`.
    ///
    /// Maps are ordered so the JSON encoding is deterministic; empty maps are
    /// left out of the key.
    pub fn response(
        name: &str,
        params: &BTreeMap<String, String>,
        query: &BTreeMap<String, String>,
    ) -> String {
        let mut key = format!("cache:{name}");
        for part in [params, query] {
            if !part.is_empty() {
                key.push(':');
                key.push_str(&serde_json::to_string(part).unwrap_or_default());
            }
        }
        key
    }
}
