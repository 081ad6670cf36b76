//! In-memory cache for signed object URLs.
//! Maps a stored object's name to a temporary URL and its expiry instant.

use std::collections::HashMap;

/// Validity window requested from the storage collaborator.
pub const SIGNED_URL_TTL_SECS: u32 = 3600;

/// The cache records a shorter effective lifetime than the requested
/// validity so a URL is never handed out in the last moments before the
/// server stops honoring it.
pub const SIGNED_URL_TTL_MARGIN_SECS: u32 = 300;

/// Lifetime recorded for page-local `blob:` URLs. They stay valid for the
/// whole page session; the value only needs to outlive any realistic one.
pub const LOCAL_BLOB_TTL_SECS: u32 = 24 * 3600;

/// Current wall-clock time in milliseconds since the Unix epoch.
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as f64)
        .unwrap_or(0.0)
}

/// Whether a URL is a page-local object URL rather than a server-issued one.
pub fn is_blob_url(url: &str) -> bool {
    url.starts_with("blob:")
}

/// Revoke a page-local object URL so the underlying handle is not leaked.
/// Server-issued URLs pass through untouched.
#[cfg(target_arch = "wasm32")]
pub fn release_url_if_blob(url: &str) {
    if is_blob_url(url) {
        let _ = web_sys::Url::revoke_object_url(url);
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn release_url_if_blob(_url: &str) {}

/// Cached URL with its effective expiry instant.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub url: String,
    pub expires_at_ms: f64,
}

impl CacheEntry {
    fn new(url: String, ttl_secs: u32, now_ms: f64) -> Self {
        let effective_secs = if ttl_secs > SIGNED_URL_TTL_MARGIN_SECS {
            ttl_secs - SIGNED_URL_TTL_MARGIN_SECS
        } else {
            ttl_secs
        };
        Self {
            url,
            expires_at_ms: now_ms + f64::from(effective_secs) * 1000.0,
        }
    }

    pub fn is_expired(&self, now_ms: f64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

/// Session-scoped cache of temporary access URLs, keyed by object name.
/// No eviction beyond overwrite-on-refresh; entries die with the page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignedUrlCache {
    entries: HashMap<String, CacheEntry>,
}

impl SignedUrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cached URL is only returned while it is still inside its effective
    /// validity window; an expired entry is treated as absent.
    pub fn get(&self, name: &str, now_ms: f64) -> Option<&str> {
        self.entries
            .get(name)
            .filter(|entry| !entry.is_expired(now_ms))
            .map(|entry| entry.url.as_str())
    }

    /// Store a URL under `name`, replacing any previous entry. Returns the
    /// URL that was displaced (when it differs), so the caller can decide
    /// whether a page-local URL is safe to release yet.
    pub fn put(
        &mut self,
        name: impl Into<String>,
        url: impl Into<String>,
        ttl_secs: u32,
        now_ms: f64,
    ) -> Option<String> {
        let url = url.into();
        self.entries
            .insert(name.into(), CacheEntry::new(url.clone(), ttl_secs, now_ms))
            .filter(|previous| previous.url != url)
            .map(|previous| previous.url)
    }

    /// Drop (and release) a single entry.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.entries.remove(name) {
            Some(entry) => {
                release_url_if_blob(&entry.url);
                true
            }
            None => false,
        }
    }

    /// URLs of entries that reference page-local object URLs.
    pub fn blob_urls(&self) -> Vec<String> {
        self.entries
            .values()
            .filter(|entry| is_blob_url(&entry.url))
            .map(|entry| entry.url.clone())
            .collect()
    }

    /// Teardown: revoke every page-local object URL and empty the cache.
    /// Server-issued signed URLs need no release.
    pub fn release_all(&mut self) {
        for entry in self.entries.values() {
            release_url_if_blob(&entry.url);
        }
        self.entries.clear();
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: f64 = 1_700_000_000_000.0;

    fn at(seconds: u32) -> f64 {
        T0 + f64::from(seconds) * 1000.0
    }

    #[test]
    fn get_returns_url_while_inside_effective_window() {
        let mut cache = SignedUrlCache::new();
        cache.put("song.mp3", "https://cdn/a?token=1", SIGNED_URL_TTL_SECS, T0);

        assert_eq!(cache.get("song.mp3", T0), Some("https://cdn/a?token=1"));
        assert_eq!(
            cache.get("song.mp3", at(3299)),
            Some("https://cdn/a?token=1")
        );
    }

    #[test]
    fn safety_margin_expires_entries_before_requested_validity() {
        let mut cache = SignedUrlCache::new();
        cache.put("song.mp3", "https://cdn/a?token=1", 3600, T0);

        // Requested 3600 s of validity, but the recorded expiry is earlier.
        assert_eq!(cache.get("song.mp3", at(3300)), None);
        assert_eq!(cache.get("song.mp3", at(3550)), None);
        assert_eq!(cache.get("song.mp3", at(3600)), None);
    }

    #[test]
    fn expired_entries_are_absent_not_served() {
        let mut cache = SignedUrlCache::new();
        cache.put("song.mp3", "https://cdn/a?token=1", 3600, T0);
        assert_eq!(cache.get("song.mp3", at(4000)), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn refresh_overwrites_and_extends() {
        let mut cache = SignedUrlCache::new();
        cache.put("song.mp3", "https://cdn/a?token=1", 3600, T0);
        cache.put("song.mp3", "https://cdn/a?token=2", 3600, at(3400));

        assert_eq!(
            cache.get("song.mp3", at(3500)),
            Some("https://cdn/a?token=2")
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn short_ttls_keep_their_full_window() {
        let mut cache = SignedUrlCache::new();
        cache.put("song.mp3", "https://cdn/a", 60, T0);
        assert_eq!(cache.get("song.mp3", at(59)), Some("https://cdn/a"));
        assert_eq!(cache.get("song.mp3", at(60)), None);
    }

    #[test]
    fn unknown_names_are_absent() {
        let cache = SignedUrlCache::new();
        assert_eq!(cache.get("nope.mp3", T0), None);
    }

    #[test]
    fn blob_urls_are_tracked_for_release() {
        let mut cache = SignedUrlCache::new();
        cache.put("local.mp3", "blob:https://app/123", LOCAL_BLOB_TTL_SECS, T0);
        cache.put("remote.mp3", "https://cdn/b?token=1", 3600, T0);

        assert!(is_blob_url("blob:https://app/123"));
        assert!(!is_blob_url("https://cdn/b?token=1"));
        assert_eq!(cache.blob_urls(), vec!["blob:https://app/123".to_string()]);

        cache.release_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn put_reports_the_displaced_url() {
        let mut cache = SignedUrlCache::new();
        assert_eq!(cache.put("a.mp3", "blob:https://app/1", 3600, T0), None);
        assert_eq!(
            cache.put("a.mp3", "https://cdn/a", 3600, T0),
            Some("blob:https://app/1".to_string())
        );
        // Re-storing the same URL is not a displacement.
        assert_eq!(cache.put("a.mp3", "https://cdn/a", 3600, at(10)), None);
    }

    #[test]
    fn remove_drops_the_entry() {
        let mut cache = SignedUrlCache::new();
        cache.put("song.mp3", "https://cdn/a", 3600, T0);
        assert!(cache.remove("song.mp3"));
        assert!(!cache.remove("song.mp3"));
        assert_eq!(cache.get("song.mp3", T0), None);
    }
}
