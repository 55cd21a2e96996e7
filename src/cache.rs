use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::TokenUsage;

/// Home directory, or the current directory when `HOME` is unset.
pub fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Token usage persisted as JSON in `~/.vim4rabbit/usage.json`.
pub struct UsageCache {
    cache_dir: PathBuf,
}

impl UsageCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Default cache directory under the user's home.
    pub fn default_dir() -> PathBuf {
        home_dir().join(".vim4rabbit")
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn cache_file(&self) -> PathBuf {
        self.cache_dir.join("usage.json")
    }

    /// Load cached usage. A missing or unreadable file is a miss.
    pub fn load(&self) -> Option<TokenUsage> {
        let path = self.cache_file();
        if !path.exists() {
            debug!("no usage cache at {}", path.display());
            return None;
        }
        read_usage_file(&path)
    }

    /// Overwrite the cache file, creating the directory if needed.
    pub fn save(&self, usage: &TokenUsage) -> Result<()> {
        std::fs::create_dir_all(&self.cache_dir)
            .map_err(|e| Error::Cache(format!("failed to create cache dir: {e}")))?;

        let content = serde_json::to_string(usage)
            .map_err(|e| Error::Cache(format!("failed to serialize usage: {e}")))?;

        std::fs::write(self.cache_file(), content)
            .map_err(|e| Error::Cache(format!("failed to write cache file: {e}")))?;

        Ok(())
    }

    /// `save` for callers that only need to know whether it worked.
    pub fn try_save(&self, usage: &TokenUsage) -> bool {
        match self.save(usage) {
            Ok(()) => true,
            Err(e) => {
                warn!("{e}");
                false
            }
        }
    }
}

/// Read a `{"used", "limit", "provider"}` file, logging and discarding failures.
pub fn read_usage_file(path: &Path) -> Option<TokenUsage> {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<TokenUsage>(&content) {
            Ok(usage) => Some(usage),
            Err(e) => {
                warn!("ignoring malformed usage file {}: {e}", path.display());
                None
            }
        },
        Err(e) => {
            warn!("failed to read usage file {}: {e}", path.display());
            None
        }
    }
}

/// Where the coderabbit CLI itself keeps usage, `~/.config/coderabbit/usage.json`.
pub fn default_vendor_usage_file() -> PathBuf {
    home_dir()
        .join(".config")
        .join("coderabbit")
        .join("usage.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn test_cache() -> (TempDir, UsageCache) {
        let dir = TempDir::new().unwrap();
        let cache = UsageCache::new(dir.path().join(".vim4rabbit"));
        (dir, cache)
    }

    #[test]
    fn test_load_missing_returns_none() {
        let (_dir, cache) = test_cache();
        assert!(cache.load().is_none());
    }

    #[test]
    fn test_load_existing_cache() {
        let (_dir, cache) = test_cache();
        std::fs::create_dir_all(cache.cache_dir()).unwrap();
        std::fs::write(
            cache.cache_file(),
            r#"{"used":5000,"limit":10000,"provider":"test"}"#,
        )
        .unwrap();

        let usage = cache.load().unwrap();
        assert_eq!(usage.used, 5000);
        assert_eq!(usage.limit, 10000);
        assert_eq!(usage.provider, "test");
        assert_eq!(usage.percentage(), 50);
    }

    #[test]
    fn test_malformed_cache_is_miss() {
        let (_dir, cache) = test_cache();
        std::fs::create_dir_all(cache.cache_dir()).unwrap();
        std::fs::write(cache.cache_file(), "not valid json {{{").unwrap();
        assert!(cache.load().is_none());
    }

    #[test]
    fn test_non_object_cache_is_miss() {
        let (_dir, cache) = test_cache();
        std::fs::create_dir_all(cache.cache_dir()).unwrap();
        std::fs::write(cache.cache_file(), "[1, 2, 3]").unwrap();
        assert!(cache.load().is_none());
    }

    #[test]
    fn test_save_creates_dir_and_roundtrips() {
        let (_dir, cache) = test_cache();
        let usage = TokenUsage::new(12345, 100000, "coderabbit");
        cache.save(&usage).unwrap();
        assert!(cache.cache_file().exists());
        assert_eq!(cache.load().unwrap(), usage);
    }

    #[test]
    fn test_save_overwrites() {
        let (_dir, cache) = test_cache();
        cache.save(&TokenUsage::new(1, 10, "a")).unwrap();
        cache.save(&TokenUsage::new(2, 20, "b")).unwrap();
        let content = std::fs::read_to_string(cache.cache_file()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"used": 2, "limit": 20, "provider": "b"})
        );
    }

    #[test]
    fn test_try_save_reports_failure() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let cache = UsageCache::new(blocker.join("nested"));
        assert!(!cache.try_save(&TokenUsage::new(1, 2, "x")));
    }

    #[test]
    #[serial]
    fn test_default_dir_uses_home() {
        let dir = TempDir::new().unwrap();
        let old = std::env::var_os("HOME");
        unsafe { std::env::set_var("HOME", dir.path()) };

        assert_eq!(UsageCache::default_dir(), dir.path().join(".vim4rabbit"));
        assert_eq!(
            default_vendor_usage_file(),
            dir.path().join(".config/coderabbit/usage.json")
        );

        match old {
            Some(h) => unsafe { std::env::set_var("HOME", h) },
            None => unsafe { std::env::remove_var("HOME") },
        }
    }
}
