//! Async wrapper around [`MarketSdk`] for use in async runtimes (Tokio, etc.).
//!
//! Runs all SDK operations on a blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free.
//! Backend fetches use a blocking HTTP client and the pipeline itself is
//! CPU-bound but fast, making this approach efficient.
//!
//! # Example
//!
//! ```no_run
//! use coin_market_sdk::{AsyncMarketSdk, SearchRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let sdk = AsyncMarketSdk::builder()
//!         .base_url("https://example.supabase.co")
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     // Run any sync SDK method via closure
//!     let featured = sdk.run(|s| s.listings().featured(12)).await.unwrap();
//!
//!     // Convenience method for search
//!     let results = sdk.search(SearchRequest::default()).await.unwrap();
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{MarketError, Result};
use crate::models::Bid;
use crate::pipeline::{SearchRequest, SearchResults};
use crate::MarketSdk;

// ---------------------------------------------------------------------------
// AsyncMarketSdkBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncMarketSdk`] instance.
///
/// Exposes the subset of [`MarketSdkBuilder`](crate::MarketSdkBuilder)
/// options that can cross a thread boundary; use
/// [`AsyncMarketSdk::from_sdk`] for anything more custom.
#[derive(Default)]
pub struct AsyncMarketSdkBuilder {
    base_url: Option<String>,
    api_key: Option<String>,
    cache_dir: Option<PathBuf>,
    offline: bool,
    timeout: Option<Duration>,
}

impl AsyncMarketSdkBuilder {
    /// Set the backend base URL.
    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    /// Set the backend API key.
    pub fn api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    /// Set a custom cache directory.
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable offline mode.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the HTTP request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the async SDK.
    ///
    /// Initialization runs on the blocking thread pool so it won't block
    /// the async event loop.
    pub async fn build(self) -> Result<AsyncMarketSdk> {
        tokio::task::spawn_blocking(move || {
            let mut builder = MarketSdk::builder().offline(self.offline);
            if let Some(url) = self.base_url {
                builder = builder.base_url(&url);
            }
            if let Some(key) = self.api_key {
                builder = builder.api_key(&key);
            }
            if let Some(dir) = self.cache_dir {
                builder = builder.cache_dir(dir);
            }
            if let Some(timeout) = self.timeout {
                builder = builder.timeout(timeout);
            }
            Ok(AsyncMarketSdk::from_sdk(builder.build()?))
        })
        .await
        .map_err(|e| MarketError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncMarketSdk
// ---------------------------------------------------------------------------

/// Async wrapper around [`MarketSdk`].
///
/// All operations are dispatched to a blocking thread pool via
/// [`tokio::task::spawn_blocking`]. The underlying [`MarketSdk`] is
/// protected by a [`Mutex`] since it uses `RefCell` internally.
#[derive(Clone)]
pub struct AsyncMarketSdk {
    inner: Arc<Mutex<MarketSdk>>,
}

impl AsyncMarketSdk {
    /// Create a new builder for configuring the async SDK.
    pub fn builder() -> AsyncMarketSdkBuilder {
        AsyncMarketSdkBuilder::default()
    }

    /// Wrap an already-built SDK.
    pub fn from_sdk(sdk: MarketSdk) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sdk)),
        }
    }

    /// Run a sync SDK operation on the blocking thread pool.
    ///
    /// The closure receives an `&MarketSdk` reference and should return
    /// a `Result<T>`.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&MarketSdk) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let sdk = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = sdk
                .lock()
                .map_err(|_| MarketError::InvalidArgument("SDK lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| MarketError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Run a listing search asynchronously.
    pub async fn search(&self, request: SearchRequest) -> Result<Arc<SearchResults>> {
        self.run(move |s| s.listings().search(&request)).await
    }

    /// Validate and place a bid asynchronously.
    pub async fn place_bid(&self, listing_id: &str, bidder_id: &str, amount: f64) -> Result<Bid> {
        let listing_id = listing_id.to_string();
        let bidder_id = bidder_id.to_string();
        self.run(move |s| s.bids().place(&listing_id, &bidder_id, amount))
            .await
    }

    /// Re-fetch the listing feed asynchronously.
    pub async fn refresh(&self) -> Result<usize> {
        self.run(|s| s.refresh()).await
    }
}
