//! TTL-aware local cache for the raw listing feed.
//!
//! Stores the last fetched feed on disk together with its fetch time. A
//! snapshot older than the TTL is re-fetched from the [`ListingSource`];
//! if that fails, the stale copy is served instead and no further fetch is
//! attempted until the retry backoff has passed.

use crate::config;
use crate::error::{MarketError, Result};
use crate::source::ListingSource;
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use serde_json::Value;
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Caches the raw listing feed on disk.
///
/// Reads `listings.json`, or `listings.json.gz` transparently when only the
/// compressed form is present. Always writes uncompressed JSON.
pub struct SnapshotCache {
    /// Directory where cached files are stored.
    pub cache_dir: PathBuf,
    /// If true, never fetch from the source (use cached files only).
    pub offline: bool,
    ttl: Duration,
    retry_backoff: Duration,
    /// When the last refetch failed and the stale copy was served.
    failed_at: Mutex<Option<Instant>>,
}

impl SnapshotCache {
    /// Create a new snapshot cache.
    ///
    /// If `cache_dir` is `None`, uses the platform-appropriate default cache directory.
    /// Creates the cache directory if it does not exist.
    pub fn new(cache_dir: Option<PathBuf>, offline: bool, ttl: Duration) -> Result<Self> {
        let dir = cache_dir.unwrap_or_else(config::default_cache_dir);
        fs::create_dir_all(&dir)?;
        Ok(Self {
            cache_dir: dir,
            offline,
            ttl,
            retry_backoff: config::FETCH_RETRY_BACKOFF,
            failed_at: Mutex::new(None),
        })
    }

    /// Set how long a stale copy is served after a failed refetch.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn retry_backoff(&self) -> Duration {
        self.retry_backoff
    }

    /// True while a recent fetch failure suppresses refetching.
    pub fn in_backoff(&self) -> bool {
        match self.failed_at.lock() {
            Ok(guard) => guard.map_or(false, |at| at.elapsed() < self.retry_backoff),
            Err(_) => false,
        }
    }

    fn set_failed_at(&self, at: Option<Instant>) {
        if let Ok(mut guard) = self.failed_at.lock() {
            *guard = at;
        }
    }

    /// Whether the next [`load`](Self::load) would go to the source: the
    /// cache is stale, online, and not backing off after a failure.
    pub fn needs_fetch(&self) -> bool {
        !self.offline && self.is_stale() && !self.in_backoff()
    }

    /// Path of the cached feed; prefers the plain file over the gzip one.
    fn snapshot_path(&self) -> PathBuf {
        let plain = self.cache_dir.join(config::SNAPSHOT_FILE);
        let gz = self.cache_dir.join(config::SNAPSHOT_FILE_GZ);
        if !plain.exists() && gz.exists() {
            gz
        } else {
            plain
        }
    }

    pub fn is_cached(&self) -> bool {
        self.snapshot_path().exists()
    }

    /// Read the time of the last successful fetch from `fetched_at.txt`.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        let path = self.cache_dir.join(config::FETCHED_AT_FILE);
        let raw = fs::read_to_string(path).ok()?;
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn save_fetched_at(&self, at: DateTime<Utc>) {
        let path = self.cache_dir.join(config::FETCHED_AT_FILE);
        if let Err(e) = fs::write(path, at.to_rfc3339()) {
            warn!(error = %e, "failed to record snapshot fetch time");
        }
    }

    /// Check if the cached feed is missing or older than the TTL.
    pub fn is_stale(&self) -> bool {
        if !self.is_cached() {
            return true;
        }
        match self.fetched_at() {
            None => true,
            Some(at) => {
                let age = Utc::now().signed_duration_since(at);
                match chrono::Duration::from_std(self.ttl) {
                    Ok(ttl) => age >= ttl,
                    Err(_) => false,
                }
            }
        }
    }

    /// Write a raw feed to the cache.
    ///
    /// Writes to a temp file first and renames on success, so an interrupted
    /// write never leaves a corrupt snapshot behind.
    pub fn store(&self, raw: &Value) -> Result<PathBuf> {
        let dest = self.cache_dir.join(config::SNAPSHOT_FILE);
        let tmp = dest.with_extension("json.tmp");

        let result = (|| -> Result<()> {
            fs::write(&tmp, serde_json::to_vec(raw)?)?;
            fs::rename(&tmp, &dest)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result?;

        self.save_fetched_at(Utc::now());
        Ok(dest)
    }

    /// Load and parse the cached feed (handles `.gz` transparently).
    ///
    /// If the cached file is corrupt it is deleted so the next load fetches
    /// a fresh copy.
    pub fn load_cached(&self) -> Result<Value> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Err(MarketError::NotFound(format!(
                "no cached listing snapshot in {}",
                self.cache_dir.display()
            )));
        }

        match read_json(&path) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt snapshot cache file, removing");
                let _ = fs::remove_file(&path);
                Err(MarketError::NotFound(format!(
                    "Cache file '{}' was corrupt and has been removed. \
                     Retry to re-fetch. Original error: {}",
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("unknown"),
                    e
                )))
            }
        }
    }

    /// Return the raw listing feed, fetching from `source` when the cache is
    /// missing or stale.
    pub fn load(&self, source: &dyn ListingSource) -> Result<Value> {
        let cached = self.is_cached();

        if cached && (self.offline || !self.is_stale() || self.in_backoff()) {
            return self.load_cached();
        }
        if self.offline {
            return Err(MarketError::NotFound(
                "Listing snapshot not cached and offline mode is enabled".into(),
            ));
        }

        match self.fetch_and_store(source) {
            Ok(raw) => Ok(raw),
            Err(e) if cached => {
                warn!(
                    error = %e,
                    retry_in_secs = self.retry_backoff.as_secs(),
                    "listing fetch failed; serving stale snapshot"
                );
                self.set_failed_at(Some(Instant::now()));
                self.load_cached()
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch from the source regardless of freshness.
    pub fn refresh(&self, source: &dyn ListingSource) -> Result<Value> {
        if self.offline {
            return self.load_cached();
        }
        self.fetch_and_store(source)
    }

    fn fetch_and_store(&self, source: &dyn ListingSource) -> Result<Value> {
        let raw = source.fetch_listings()?;
        if !raw.is_array() {
            return Err(MarketError::InvalidArgument(
                "listing source returned a non-array feed".into(),
            ));
        }
        self.store(&raw)?;
        self.set_failed_at(None);
        info!(dir = %self.cache_dir.display(), "listing snapshot refreshed");
        Ok(raw)
    }

    /// Remove all cached files and recreate the cache directory.
    pub fn clear(&self) -> Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
            fs::create_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let contents = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        let file = fs::File::open(path)?;
        let mut reader = BufReader::new(GzDecoder::new(BufReader::new(file)));
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        contents
    } else {
        fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&contents)?)
}
