use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Bid: persisted bid as returned by the backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: String,
    pub listing_id: String,
    pub bidder_id: String,
    pub amount: f64,
    pub created_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// NewBid: validated bid awaiting persistence
// ---------------------------------------------------------------------------

/// A bid that passed validation and is ready to hand to a [`BidSink`](crate::source::BidSink).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBid {
    pub listing_id: String,
    pub bidder_id: String,
    pub amount: f64,
}
