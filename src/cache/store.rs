//! TTL cache store persisting API responses to disk
//!
//! Provides a `CacheStore` that writes serializable data to JSON files stamped
//! with their write time. Reads enforce a caller-supplied TTL: expired or
//! unreadable entries are deleted on the spot and reported as a miss, so a hit
//! always carries fresh, well-formed data.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Wrapper struct for cached data stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// When the data was written
    cached_at: DateTime<Utc>,
    /// The cached data
    data: T,
}

/// Timestamp-only view of an entry, used for introspection without
/// deserializing the payload
#[derive(Debug, Deserialize)]
struct EntryStamp {
    cached_at: DateTime<Utc>,
}

/// Stores keyed entries as JSON files with write timestamps
///
/// Entries live in an XDG-compliant cache directory (`~/.cache/clashview/` on
/// Linux). Freshness is decided at read time from the entry's write timestamp
/// and the TTL the caller passes in; the store itself holds no per-kind
/// policy. A read that finds an expired or corrupt entry deletes it and
/// returns a miss. Write failures are logged and swallowed; a failed write
/// only means the next read refetches.
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl CacheStore {
    /// Creates a new CacheStore using the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no
    /// home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "clashview")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a new CacheStore with a custom cache directory
    ///
    /// Useful for testing or when a specific cache location is needed.
    #[allow(dead_code)]
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Returns the path to the cache file for the given key
    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Reads a value from the cache, enforcing the given TTL
    ///
    /// An entry is fresh iff `now - cached_at <= ttl`. Expired entries are
    /// deleted and reported as a miss (expired data is never handed out), as
    /// are entries that cannot be parsed.
    ///
    /// # Arguments
    /// * `key` - The cache key to read
    /// * `ttl` - How long after its write an entry stays fresh
    ///
    /// # Returns
    /// * `Some(T)` if a fresh entry exists and deserializes
    /// * `None` on a miss, an expired entry, or a corrupt entry
    pub fn get<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let path = self.entry_path(key);
        let content = fs::read_to_string(&path).ok()?;

        let entry: CacheEntry<T> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(key, error = %err, "removing unreadable cache entry");
                let _ = fs::remove_file(&path);
                return None;
            }
        };

        if Utc::now() - entry.cached_at > ttl {
            tracing::debug!(key, "removing expired cache entry");
            let _ = fs::remove_file(&path);
            return None;
        }

        Some(entry.data)
    }

    /// Writes a value to the cache, stamped with the current time
    ///
    /// Overwrites any prior entry at the key. Failures (unwritable directory,
    /// serialization error) are logged at warn level and swallowed; callers
    /// never see a cache write fail.
    ///
    /// # Arguments
    /// * `key` - Unique identifier for the cache entry (e.g., "members_2GQLU8YLP")
    /// * `data` - The data to cache (must implement Serialize)
    pub fn set<T: Serialize>(&self, key: &str, data: &T) {
        if let Err(err) = self.try_set(key, data) {
            tracing::warn!(key, error = %err, "failed to write cache entry");
        }
    }

    /// Fallible write used by `set`
    fn try_set<T: Serialize>(&self, key: &str, data: &T) -> std::io::Result<()> {
        self.ensure_dir()?;

        let entry = CacheEntry {
            cached_at: Utc::now(),
            data,
        };
        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(self.entry_path(key), json)
    }

    /// Deletes the entry at the given key, if present
    #[allow(dead_code)]
    pub fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.entry_path(key));
    }

    /// Deletes every entry in the store
    pub fn clear(&self) {
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                if let Err(err) = fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), error = %err, "failed to remove cache entry");
                }
            }
        }
    }

    /// Returns the write time of the entry at the given key
    ///
    /// Pure introspection: does not evict, even if the entry is expired for
    /// every TTL in use.
    pub fn timestamp_of(&self, key: &str) -> Option<DateTime<Utc>> {
        let content = fs::read_to_string(self.entry_path(key)).ok()?;
        let stamp: EntryStamp = serde_json::from_str(&content).ok()?;
        Some(stamp.cached_at)
    }

    /// Returns whether a fresh entry exists at the key, without side effects
    #[allow(dead_code)]
    pub fn is_fresh(&self, key: &str, ttl: Duration) -> bool {
        self.timestamp_of(key)
            .map_or(false, |cached_at| Utc::now() - cached_at <= ttl)
    }
}
