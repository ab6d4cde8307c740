//! Bid queries: validation, placement and history.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::bidding;
use crate::error::{MarketError, Result};
use crate::models::Bid;
use crate::pipeline::loader;
use crate::queries::ListingQuery;
use crate::MarketSdk;

// ---------------------------------------------------------------------------
// BidQuery
// ---------------------------------------------------------------------------

/// Query interface for auction bids.
pub struct BidQuery<'a> {
    sdk: &'a MarketSdk,
}

impl<'a> BidQuery<'a> {
    /// Create a new `BidQuery` bound to the given SDK.
    pub fn new(sdk: &'a MarketSdk) -> Self {
        Self { sdk }
    }

    /// Validate a proposed bid against a listing's current state.
    pub fn validate(&self, listing_id: &str, amount: f64) -> Result<()> {
        self.validate_at(listing_id, amount, Utc::now())
    }

    /// Validate a proposed bid as of `now`.
    pub fn validate_at(&self, listing_id: &str, amount: f64, now: DateTime<Utc>) -> Result<()> {
        let listing = ListingQuery::new(self.sdk).require(listing_id)?;
        bidding::validate_for_listing(&listing, amount, now)
    }

    /// Validate a bid and hand it to the bid sink for persistence.
    ///
    /// Nothing is submitted when validation fails.
    pub fn place(&self, listing_id: &str, bidder_id: &str, amount: f64) -> Result<Bid> {
        let sink = self.sdk.bid_sink.as_ref().ok_or_else(|| {
            MarketError::InvalidArgument("no bid sink configured".into())
        })?;

        let listing = ListingQuery::new(self.sdk).require(listing_id)?;
        let new_bid = bidding::prepare_bid(&listing, bidder_id, amount, Utc::now())?;
        // The snapshot may lag behind bids accepted since it was fetched.
        let recorded = self.recorded_highest(listing_id)?;
        if recorded > bidding::current_highest(&listing) {
            bidding::validate_bid(amount, recorded)?;
        }

        let stored = sink.submit(&new_bid)?;
        let bid = loader::normalize_bid(&stored).ok_or_else(|| {
            MarketError::InvalidArgument(format!("backend returned a malformed bid: {}", stored))
        })?;
        info!(listing = %bid.listing_id, amount = bid.amount, "bid placed");
        Ok(bid)
    }

    /// Bids on a listing, highest first.
    pub fn history(&self, listing_id: &str) -> Result<Vec<Bid>> {
        let raw = self.sdk.source.fetch_bids(listing_id)?;
        let mut bids = loader::normalize_bids(&raw)?;
        bids.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        Ok(bids)
    }

    /// The amount a new bid must beat, taking recorded bids into account.
    pub fn highest(&self, listing_id: &str) -> Result<f64> {
        let listing = ListingQuery::new(self.sdk).require(listing_id)?;
        let recorded = self.recorded_highest(listing_id)?;
        Ok(bidding::current_highest(&listing).max(recorded))
    }

    fn recorded_highest(&self, listing_id: &str) -> Result<f64> {
        Ok(self
            .history(listing_id)?
            .first()
            .map(|b| b.amount)
            .unwrap_or(0.0))
    }
}
