//! Listing queries over the current snapshot.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;

use crate::error::{MarketError, Result};
use crate::models::{Listing, ListingFacets};
use crate::pipeline::{facets, filter, FilterCriteria, SearchRequest, SearchResults, SortKey};
use crate::MarketSdk;

// ---------------------------------------------------------------------------
// ListingQuery
// ---------------------------------------------------------------------------

/// Query interface for marketplace listings.
pub struct ListingQuery<'a> {
    sdk: &'a MarketSdk,
}

impl<'a> ListingQuery<'a> {
    /// Create a new `ListingQuery` bound to the given SDK.
    pub fn new(sdk: &'a MarketSdk) -> Self {
        Self { sdk }
    }

    // -- Lookup ------------------------------------------------------------

    /// Every listing in the current snapshot, in feed order.
    pub fn all(&self) -> Result<Vec<Listing>> {
        Ok(self.sdk.snapshot()?.listings.clone())
    }

    /// Retrieve a single listing by id.
    pub fn get_by_id(&self, id: &str) -> Result<Option<Listing>> {
        let snapshot = self.sdk.snapshot()?;
        Ok(snapshot.listings.iter().find(|l| l.id == id).cloned())
    }

    /// Like [`get_by_id`](Self::get_by_id), but a missing listing is an error.
    pub fn require(&self, id: &str) -> Result<Listing> {
        self.get_by_id(id)?
            .ok_or_else(|| MarketError::NotFound(format!("listing {}", id)))
    }

    // -- Search ------------------------------------------------------------

    /// Run the full filter / score / sort pipeline.
    pub fn search(&self, request: &SearchRequest) -> Result<Arc<SearchResults>> {
        let snapshot = self.sdk.snapshot()?;
        Ok(self.sdk.pipeline.run(&snapshot, request))
    }

    /// Count listings matching the criteria.
    pub fn count(&self, criteria: &FilterCriteria) -> Result<usize> {
        let snapshot = self.sdk.snapshot()?;
        Ok(filter::count_matching(
            &snapshot.listings,
            criteria,
            self.sdk.pipeline.classifier(),
        ))
    }

    /// Featured listings, newest first.
    pub fn featured(&self, limit: usize) -> Result<Vec<Listing>> {
        let criteria = FilterCriteria {
            featured_only: Some(true),
            ..Default::default()
        };
        self.listed(criteria, SortKey::RecentlyAdded, Some(limit))
    }

    /// All listings of one seller, newest first.
    pub fn by_seller(&self, seller_id: &str) -> Result<Vec<Listing>> {
        let criteria = FilterCriteria {
            seller_id: Some(seller_id.to_string()),
            ..Default::default()
        };
        self.listed(criteria, SortKey::RecentlyAdded, None)
    }

    /// Open auctions with a known end time, soonest ending first.
    pub fn ending_soon(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<Listing>> {
        let snapshot = self.sdk.snapshot()?;
        let mut open: Vec<&Listing> = snapshot
            .listings
            .iter()
            .filter(|l| l.auction_end.is_some() && l.is_open_at(now))
            .collect();
        open.sort_by_key(|l| l.auction_end);
        Ok(open.into_iter().take(limit).cloned().collect())
    }

    /// Return up to `count` randomly-sampled listings.
    pub fn random(&self, count: usize) -> Result<Vec<Listing>> {
        let snapshot = self.sdk.snapshot()?;
        let mut rng = rand::thread_rng();
        Ok(snapshot
            .listings
            .choose_multiple(&mut rng, count)
            .cloned()
            .collect())
    }

    // -- Classification ----------------------------------------------------

    /// Aggregate counts and bounds for building filter controls.
    pub fn facets(&self) -> Result<ListingFacets> {
        let snapshot = self.sdk.snapshot()?;
        Ok(facets::compute_facets(&snapshot.listings))
    }

    /// Category tags that apply to a listing.
    pub fn categories(&self, id: &str) -> Result<Vec<String>> {
        let listing = self.require(id)?;
        Ok(self
            .sdk
            .pipeline
            .classifier()
            .classify(&listing)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    fn listed(
        &self,
        criteria: FilterCriteria,
        sort: SortKey,
        limit: Option<usize>,
    ) -> Result<Vec<Listing>> {
        let request = SearchRequest {
            criteria,
            sort,
            limit,
            offset: None,
        };
        let results = self.search(&request)?;
        Ok(results.items.iter().map(|s| s.listing.clone()).collect())
    }
}
