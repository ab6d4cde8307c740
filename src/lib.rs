//! Coin marketplace SDK for Rust.
//!
//! Provides a high-level client over a coin and banknote marketplace backend.
//! The listing feed is fetched from the backend's REST API, cached locally,
//! and searched in-process by a pure normalize / filter / rank pipeline.
//!
//! # Quick start
//!
//! ```no_run
//! use coin_market_sdk::{FilterCriteria, MarketSdk, SearchRequest, SortKey};
//!
//! let sdk = MarketSdk::builder()
//!     .base_url("https://example.supabase.co")
//!     .api_key("anon-key")
//!     .build()
//!     .unwrap();
//!
//! // Search listings
//! let request = SearchRequest::new(
//!     FilterCriteria {
//!         query: Some("morgan".into()),
//!         price_range: Some((0.0, 500.0)),
//!         ..Default::default()
//!     },
//!     SortKey::Relevance,
//! );
//! let results = sdk.listings().search(&request).unwrap();
//!
//! // Place a bid
//! let bid = sdk.bids().place("listing-id", "bidder-id", 125.0).unwrap();
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod bidding;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod queries;
pub mod rest_query;
pub mod source;

#[cfg(feature = "async")]
pub use async_client::AsyncMarketSdk;
pub use cache::SnapshotCache;
pub use error::{MarketError, Result};
pub use pipeline::{
    CategoryClassifier, FilterCriteria, ResultCache, SearchPipeline, SearchRequest,
    SearchResults, Snapshot, SortKey,
};
pub use rest_query::RestQuery;
pub use source::{BidSink, ListingSource, RestSource, StaticSource};

use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

// ---------------------------------------------------------------------------
// MarketSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`MarketSdk`] instance.
///
/// Use [`MarketSdk::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](MarketSdkBuilder::build) to create the SDK.
pub struct MarketSdkBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    cache_dir: Option<PathBuf>,
    offline: bool,
    timeout: Duration,
    snapshot_ttl: Duration,
    retry_backoff: Duration,
    result_ttl: Duration,
    classifier: Option<CategoryClassifier>,
    source: Option<Arc<dyn ListingSource>>,
    bid_sink: Option<Arc<dyn BidSink>>,
}

impl Default for MarketSdkBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            cache_dir: None,
            offline: false,
            timeout: Duration::from_secs(30),
            snapshot_ttl: config::SNAPSHOT_TTL,
            retry_backoff: config::FETCH_RETRY_BACKOFF,
            result_ttl: config::RESULT_TTL,
            classifier: None,
            source: None,
            bid_sink: None,
        }
    }
}

impl MarketSdkBuilder {
    /// Set the backend base URL (e.g. `https://project.supabase.co`).
    ///
    /// Falls back to the `COIN_MARKET_URL` environment variable.
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    /// Set the backend API key.
    ///
    /// Falls back to the `COIN_MARKET_KEY` environment variable.
    pub fn api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    /// Set a custom cache directory.
    ///
    /// If not set, the platform-appropriate default cache directory is used.
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable offline mode.
    ///
    /// When offline, the SDK never fetches from the backend and only uses the
    /// previously cached listing snapshot. Defaults to `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the HTTP request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// How long a fetched listing snapshot stays fresh. Defaults to 5 minutes.
    pub fn snapshot_ttl(mut self, ttl: Duration) -> Self {
        self.snapshot_ttl = ttl;
        self
    }

    /// How long a stale snapshot is served after a failed refetch before
    /// the backend is tried again. Defaults to 60 seconds.
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// How long a search result stays cached. Defaults to 60 seconds.
    pub fn result_ttl(mut self, ttl: Duration) -> Self {
        self.result_ttl = ttl;
        self
    }

    /// Use a custom category table instead of the standard one.
    pub fn classifier(mut self, classifier: CategoryClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Use a custom listing source instead of the REST backend.
    pub fn source<S: ListingSource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Use a custom bid sink instead of the REST backend.
    pub fn bid_sink<B: BidSink + 'static>(mut self, sink: B) -> Self {
        self.bid_sink = Some(Arc::new(sink));
        self
    }

    /// Use one value as both listing source and bid sink.
    pub fn source_and_sink<T: ListingSource + BidSink + 'static>(mut self, backend: T) -> Self {
        let backend = Arc::new(backend);
        self.source = Some(backend.clone());
        self.bid_sink = Some(backend);
        self
    }

    /// Build the SDK.
    ///
    /// Does **not** fetch any data eagerly -- the listing feed is loaded
    /// lazily on first query. Without an explicit source, a [`RestSource`]
    /// is created from the base URL, which also serves as the bid sink
    /// unless one was given.
    pub fn build(self) -> Result<MarketSdk> {
        let cache = SnapshotCache::new(self.cache_dir, self.offline, self.snapshot_ttl)?
            .with_retry_backoff(self.retry_backoff);

        let (source, bid_sink) = match self.source {
            Some(source) => (source, self.bid_sink),
            None => {
                let url = self.base_url.or_else(config::env_base_url).ok_or_else(|| {
                    MarketError::InvalidArgument(format!(
                        "no listing source: set a base URL or {}",
                        config::ENV_BASE_URL
                    ))
                })?;
                let key = self.api_key.or_else(config::env_api_key);
                let rest = Arc::new(RestSource::new(&url, key, self.timeout)?);
                let sink: Arc<dyn BidSink> = match self.bid_sink {
                    Some(sink) => sink,
                    None => rest.clone(),
                };
                (rest as Arc<dyn ListingSource>, Some(sink))
            }
        };

        let results = Arc::new(ResultCache::new(
            self.result_ttl,
            config::RESULT_CACHE_CAPACITY,
        ));
        let pipeline = SearchPipeline::new(self.classifier.unwrap_or_default()).with_cache(results);

        Ok(MarketSdk {
            source,
            bid_sink,
            cache,
            pipeline,
            snapshot: RefCell::new(None),
        })
    }
}

// ---------------------------------------------------------------------------
// MarketSdk
// ---------------------------------------------------------------------------

/// The main entry point for the marketplace SDK.
///
/// Owns the listing source, the on-disk snapshot cache and the search
/// pipeline, and exposes domain-specific query interfaces as lightweight
/// borrowing wrappers.
///
/// Created via [`MarketSdk::builder()`].
pub struct MarketSdk {
    pub(crate) source: Arc<dyn ListingSource>,
    pub(crate) bid_sink: Option<Arc<dyn BidSink>>,
    cache: SnapshotCache,
    pub(crate) pipeline: SearchPipeline,
    snapshot: RefCell<Option<Arc<Snapshot>>>,
}

impl MarketSdk {
    /// Create a new builder for configuring the SDK.
    pub fn builder() -> MarketSdkBuilder {
        MarketSdkBuilder::default()
    }

    // -- Query accessors ---------------------------------------------------

    /// Access the listing query interface.
    pub fn listings(&self) -> queries::listings::ListingQuery<'_> {
        queries::listings::ListingQuery::new(self)
    }

    /// Access the bid query interface.
    pub fn bids(&self) -> queries::bids::BidQuery<'_> {
        queries::bids::BidQuery::new(self)
    }

    // -- Snapshot management -----------------------------------------------

    /// Return the current listing snapshot, loading it on first use and
    /// reloading it once the on-disk copy goes stale. After a failed reload
    /// the in-memory snapshot is kept until the retry backoff passes.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>> {
        if let Some(current) = self.snapshot.borrow().as_ref() {
            if !self.cache.needs_fetch() {
                return Ok(Arc::clone(current));
            }
        }

        let raw = self.cache.load(self.source.as_ref())?;
        let snapshot = Arc::new(Snapshot::from_raw(&raw)?);
        info!(
            listings = snapshot.len(),
            dropped = snapshot.dropped,
            "listing snapshot loaded"
        );
        *self.snapshot.borrow_mut() = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Re-fetch the listing feed regardless of freshness.
    ///
    /// Returns the number of listings in the new snapshot.
    pub fn refresh(&self) -> Result<usize> {
        let raw = self.cache.refresh(self.source.as_ref())?;
        let snapshot = Arc::new(Snapshot::from_raw(&raw)?);
        let count = snapshot.len();
        *self.snapshot.borrow_mut() = Some(snapshot);
        if let Some(results) = self.pipeline.cache() {
            results.clear();
        }
        Ok(count)
    }

    /// Return the category classifier used by searches.
    pub fn classifier(&self) -> &CategoryClassifier {
        self.pipeline.classifier()
    }

    /// Return the on-disk snapshot cache.
    pub fn snapshot_cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Consume the SDK and release all resources.
    pub fn close(self) {
        drop(self);
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for MarketSdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loaded = self
            .snapshot
            .borrow()
            .as_ref()
            .map(|s| s.len().to_string())
            .unwrap_or_else(|| "none".to_string());
        write!(
            f,
            "MarketSdk(cache_dir={}, listings={}, offline={})",
            self.cache.cache_dir.display(),
            loaded,
            self.cache.offline
        )
    }
}
