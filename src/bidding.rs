//! Bid validation, the guard in front of the bid write path.
//!
//! Validation never mutates a listing; the backend updates `current_bid`
//! after it persists an accepted bid.

use chrono::{DateTime, Utc};

use crate::error::{MarketError, Result};
use crate::models::{Listing, NewBid};

/// Highest amount a new bid must beat: the current bid when one exists,
/// otherwise the starting price.
pub fn current_highest(listing: &Listing) -> f64 {
    match listing.current_bid {
        Some(bid) if bid > 0.0 => bid,
        _ => listing.price,
    }
}

/// Reject `amount` unless it is strictly greater than `current_highest`.
pub fn validate_bid(amount: f64, current_highest: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(MarketError::InvalidBid(format!(
            "bid amount must be a positive number, got {}",
            amount
        )));
    }
    if amount <= current_highest {
        return Err(MarketError::InvalidBid(format!(
            "bid of {:.2} must be higher than the current bid of {:.2}",
            amount, current_highest
        )));
    }
    Ok(())
}

/// Validate a bid against a listing's auction state at `now`.
pub fn validate_for_listing(listing: &Listing, amount: f64, now: DateTime<Utc>) -> Result<()> {
    if !listing.is_auction {
        return Err(MarketError::InvalidBid(format!(
            "listing {} is not an auction",
            listing.id
        )));
    }
    if !listing.is_open_at(now) {
        return Err(MarketError::InvalidBid(format!(
            "auction for listing {} has ended",
            listing.id
        )));
    }
    validate_bid(amount, current_highest(listing))
}

/// Validate and package a bid for submission.
pub fn prepare_bid(
    listing: &Listing,
    bidder_id: &str,
    amount: f64,
    now: DateTime<Utc>,
) -> Result<NewBid> {
    if bidder_id.trim().is_empty() {
        return Err(MarketError::InvalidArgument("bidder id must not be empty".into()));
    }
    validate_for_listing(listing, amount, now)?;
    Ok(NewBid {
        listing_id: listing.id.clone(),
        bidder_id: bidder_id.trim().to_string(),
        amount,
    })
}
