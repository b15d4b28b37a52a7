use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Get the platform-appropriate cache directory for hh-scout
pub fn get_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|p| p.join("hh-scout/http-cache"))
        .unwrap_or_else(|| {
            PathBuf::from(format!(
                "{}/.cache/hh-scout/http-cache",
                std::env::var("HOME").unwrap_or_default()
            ))
        })
}

/// Clear the HTTP cache directory
pub fn clear_cache() -> Result<()> {
    let cache_path = get_cache_path();
    match std::fs::remove_dir_all(&cache_path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).context("Failed to remove cache directory"),
    }
}

/// Disk-persistent cache for GET response bodies, keyed by full URL.
///
/// Uses cacache for disk persistence and an in-memory HashMap for fast access.
/// hh.ru does not send validators for résumé search, so entries simply
/// expire after `ttl`.
#[derive(Clone)]
pub struct DiskCache {
    inner: Arc<Mutex<HashMap<String, CacheEntry>>>,
    cache_path: PathBuf,
    ttl: Duration,
}

/// Serializable representation of a cache entry for disk storage
#[derive(Clone, serde::Serialize, serde::Deserialize)]
struct CacheEntry {
    stored_at: DateTime<Utc>,
    body: String,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now.signed_duration_since(self.stored_at) < ttl,
            Err(_) => true,
        }
    }
}

impl DiskCache {
    pub fn new(cache_path: PathBuf, ttl: Duration) -> Self {
        // Don't pre-load disk cache - entries are loaded on demand
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            cache_path,
            ttl,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A poisoned map only means a panic mid-insert; the data is still usable
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return a cached body if one exists and has not expired
    pub fn get(&self, key: &str) -> Option<String> {
        let now = Utc::now();

        if let Some(entry) = self.entries().get(key) {
            if entry.is_fresh(self.ttl, now) {
                return Some(entry.body.clone());
            }
        }

        let bytes = cacache::read_sync(&self.cache_path, key).ok()?;
        let entry: CacheEntry = serde_json::from_slice(&bytes).ok()?;
        if !entry.is_fresh(self.ttl, now) {
            return None;
        }

        let body = entry.body.clone();
        self.entries().insert(key.to_string(), entry);
        Some(body)
    }

    /// Store a body in memory and on disk. Disk errors are logged, not returned.
    pub fn put(&self, key: &str, body: &str) {
        let entry = CacheEntry {
            stored_at: Utc::now(),
            body: body.to_string(),
        };

        self.entries().insert(key.to_string(), entry.clone());

        match serde_json::to_vec(&entry) {
            Ok(serialized) => {
                if let Err(e) = cacache::write_sync(&self.cache_path, key, &serialized) {
                    tracing::debug!(error = %e, "failed to persist cache entry");
                }
            }
            Err(e) => tracing::debug!(error = %e, "failed to serialize cache entry"),
        }
    }

    /// Clear the in-memory cache to force fresh requests on next fetch
    pub fn clear_memory(&self) {
        self.entries().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache(name: &str, ttl: Duration) -> (DiskCache, PathBuf) {
        let path = std::env::temp_dir().join(format!("hh_scout_cache_{}", name));
        let _ = std::fs::remove_dir_all(&path);
        (DiskCache::new(path.clone(), ttl), path)
    }

    #[test]
    fn test_put_then_get() {
        let (cache, path) = temp_cache("put_get", Duration::from_secs(3600));
        assert!(cache.get("https://api.hh.ru/resumes?text=go").is_none());

        cache.put("https://api.hh.ru/resumes?text=go", "{\"items\":[]}");
        assert_eq!(
            cache.get("https://api.hh.ru/resumes?text=go").as_deref(),
            Some("{\"items\":[]}")
        );

        let _ = std::fs::remove_dir_all(&path);
    }

    #[test]
    fn test_entries_survive_memory_clear() {
        let (cache, path) = temp_cache("disk", Duration::from_secs(3600));
        cache.put("key", "body");
        cache.clear_memory();
        assert_eq!(cache.get("key").as_deref(), Some("body"));

        let _ = std::fs::remove_dir_all(&path);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let (cache, path) = temp_cache("expired", Duration::from_secs(0));
        cache.put("key", "body");
        assert!(cache.get("key").is_none());

        let _ = std::fs::remove_dir_all(&path);
    }

    #[test]
    fn test_freshness() {
        let now = Utc::now();
        let entry = CacheEntry {
            stored_at: now - chrono::Duration::minutes(30),
            body: String::new(),
        };
        assert!(entry.is_fresh(Duration::from_secs(3600), now));
        assert!(!entry.is_fresh(Duration::from_secs(600), now));
    }
}
