//! The listing search pipeline: normalize, filter, score, sort.
//!
//! Every stage is a pure function of its inputs. [`SearchPipeline`] composes
//! them and optionally memoizes results in an injected [`ResultCache`].

pub mod cache;
pub mod category;
pub mod facets;
pub mod filter;
pub mod loader;
pub mod rank;

pub use cache::{PipelineKey, ResultCache};
pub use category::CategoryClassifier;
pub use filter::FilterCriteria;
pub use loader::Snapshot;
pub use rank::{ScoredListing, SortKey};

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::models::Listing;

// ---------------------------------------------------------------------------
// SearchRequest / SearchResults
// ---------------------------------------------------------------------------

/// Filter criteria, sort order and pagination for one search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub criteria: FilterCriteria,
    #[serde(default)]
    pub sort: SortKey,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl SearchRequest {
    pub fn new(criteria: FilterCriteria, sort: SortKey) -> Self {
        Self {
            criteria,
            sort,
            limit: None,
            offset: None,
        }
    }

    pub(crate) fn hash_into<H: Hasher>(&self, state: &mut H) {
        self.criteria.hash_into(state);
        self.sort.hash(state);
        self.limit.hash(state);
        self.offset.hash(state);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    /// Number of listings that matched, before pagination.
    pub total: usize,
    pub items: Vec<ScoredListing>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|s| s.listing.id.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// SearchPipeline
// ---------------------------------------------------------------------------

static NEXT_SCOPE: AtomicU64 = AtomicU64::new(1);

/// Composes the filter and rank stages over a snapshot.
///
/// Each pipeline gets its own cache scope: its classifier is fixed at
/// construction, so results cached by one pipeline are never served to
/// another sharing the same [`ResultCache`].
pub struct SearchPipeline {
    classifier: CategoryClassifier,
    cache: Option<Arc<ResultCache<SearchResults>>>,
    scope: u64,
}

impl SearchPipeline {
    pub fn new(classifier: CategoryClassifier) -> Self {
        Self {
            classifier,
            cache: None,
            scope: NEXT_SCOPE.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Memoize results in the given cache.
    pub fn with_cache(mut self, cache: Arc<ResultCache<SearchResults>>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn classifier(&self) -> &CategoryClassifier {
        &self.classifier
    }

    pub fn cache(&self) -> Option<&ResultCache<SearchResults>> {
        self.cache.as_deref()
    }

    /// Run the pipeline over a snapshot, consulting the cache when present.
    pub fn run(&self, snapshot: &Snapshot, request: &SearchRequest) -> Arc<SearchResults> {
        let Some(cache) = &self.cache else {
            return Arc::new(self.execute(&snapshot.listings, request));
        };

        let key = PipelineKey::scoped(self.scope, snapshot.fingerprint, request);
        if let Some(hit) = cache.get(&key) {
            return hit;
        }
        cache.insert(key, self.execute(&snapshot.listings, request))
    }

    /// Normalize a raw record array and run the pipeline over it.
    pub fn run_raw(&self, raw: &Value, request: &SearchRequest) -> Result<Arc<SearchResults>> {
        let snapshot = Snapshot::from_raw(raw)?;
        Ok(self.run(&snapshot, request))
    }

    /// Filter, score, sort and paginate without touching the cache.
    pub fn execute(&self, listings: &[Listing], request: &SearchRequest) -> SearchResults {
        let filtered = filter::filter_listings(listings, &request.criteria, &self.classifier);
        let total = filtered.len();

        let mut scored = rank::score_listings(filtered, request.criteria.text_query());
        rank::sort_scored(&mut scored, request.sort);

        let offset = request.offset.unwrap_or(0);
        let limit = request.limit.unwrap_or(usize::MAX);
        let items = scored
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(listing, score)| ScoredListing {
                listing: listing.clone(),
                score,
            })
            .collect();

        SearchResults { total, items }
    }
}

impl Default for SearchPipeline {
    fn default() -> Self {
        Self::new(CategoryClassifier::standard())
    }
}
