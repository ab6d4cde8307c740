//! Normalization of raw backend records into canonical [`Listing`] and [`Bid`] values.
//!
//! The backend returns loosely-typed rows: numerics may arrive as strings,
//! keys may be snake_case or camelCase, and any field may be missing or null.
//! Everything is defaulted here, once, so later stages never branch on presence.
//! Records without a usable identifier are dropped rather than failing the batch.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{MarketError, Result};
use crate::models::{Bid, Listing, ListingKind, Rarity};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// An immutable, normalized listing set for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub listings: Vec<Listing>,
    /// Hash of the raw feed this snapshot was built from.
    pub fingerprint: u64,
    /// Number of raw records dropped for lacking an identifier.
    pub dropped: usize,
}

impl Snapshot {
    /// Normalize a raw JSON array into a snapshot.
    pub fn from_raw(raw: &Value) -> Result<Self> {
        let records = as_records(raw)?;
        let listings = normalize_records(records);
        let dropped = records.len() - listings.len();

        let mut hasher = DefaultHasher::new();
        raw.to_string().hash(&mut hasher);

        Ok(Self {
            listings,
            fingerprint: hasher.finish(),
            dropped,
        })
    }

    /// Build a snapshot from already-normalized listings (e.g. test fixtures).
    ///
    /// The fingerprint covers every field of every listing, so snapshots that
    /// differ anywhere never share cached results.
    pub fn from_listings(listings: Vec<Listing>) -> Self {
        let mut hasher = DefaultHasher::new();
        listings.len().hash(&mut hasher);
        for l in &listings {
            match serde_json::to_string(l) {
                Ok(encoded) => encoded.hash(&mut hasher),
                Err(_) => format!("{:?}", l).hash(&mut hasher),
            }
        }
        Self {
            listings,
            fingerprint: hasher.finish(),
            dropped: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Listing normalization
// ---------------------------------------------------------------------------

/// Normalize a raw JSON value that must be an array of listing records.
///
/// Returns [`MarketError::InvalidArgument`] if `raw` is not an array.
pub fn normalize(raw: &Value) -> Result<Vec<Listing>> {
    Ok(normalize_records(as_records(raw)?))
}

/// Normalize a slice of raw records, preserving order and dropping records
/// without a usable identifier.
pub fn normalize_records(records: &[Value]) -> Vec<Listing> {
    let listings: Vec<Listing> = records.iter().filter_map(normalize_record).collect();
    let dropped = records.len() - listings.len();
    if dropped > 0 {
        debug!(
            kept = listings.len(),
            dropped, "dropped listing records without an identifier"
        );
    }
    listings
}

/// Normalize a single raw record, or `None` when it has no usable identifier.
pub fn normalize_record(record: &Value) -> Option<Listing> {
    let obj = record.as_object()?;
    let id = identifier(obj, &["id", "uuid"])?;

    let category = text(obj, &["category"]);
    let kind_hint = text(obj, &["kind", "item_type", "itemType", "type"]).to_lowercase();
    let kind = if kind_hint.contains("banknote")
        || kind_hint.contains("note")
        || kind_hint.contains("paper")
        || category.to_lowercase().contains("banknote")
    {
        ListingKind::Banknote
    } else {
        ListingKind::Coin
    };

    Some(Listing {
        id,
        name: text(obj, &["name", "title"]),
        description: text(obj, &["description"]),
        country: text(obj, &["country"]),
        year: integer(obj, &["year"])
            .map(|y| y.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
            .unwrap_or(0),
        denomination: text(obj, &["denomination"]),
        composition: text(obj, &["composition", "metal", "material"]),
        condition: text(obj, &["condition"]),
        grade: text(obj, &["grade", "grading"]),
        rarity: Rarity::parse(&text(obj, &["rarity"])),
        category,
        kind,
        pcgs_number: text(obj, &["pcgs_number", "pcgsNumber", "pcgs_cert"]),
        ngc_number: text(obj, &["ngc_number", "ngcNumber", "ngc_cert"]),

        price: number(obj, &["price", "starting_price", "startingPrice"])
            .map(|p| p.max(0.0))
            .unwrap_or(0.0),
        is_auction: flag(obj, &["is_auction", "isAuction"]),
        auction_end: timestamp(obj, &["auction_end", "auctionEnd", "auction_end_time"]),
        current_bid: number(obj, &["current_bid", "currentBid"]).filter(|b| *b >= 0.0),
        reserve_price: number(obj, &["reserve_price", "reservePrice"]).filter(|r| *r >= 0.0),

        image_url: text(obj, &["image_url", "imageUrl", "image", "images"]),

        views: counter(obj, &["views", "view_count", "views_count"]),
        featured: flag(obj, &["featured", "is_featured", "isFeatured"]),
        favorites: counter(obj, &["favorites", "favorites_count", "favorite_count"]),

        seller_id: text(obj, &["seller_id", "sellerId", "store_id", "storeId", "user_id"]),
        created_at: timestamp(obj, &["created_at", "createdAt"]),
    })
}

// ---------------------------------------------------------------------------
// Bid normalization
// ---------------------------------------------------------------------------

/// Normalize a raw JSON array of bid records.
///
/// Bids lacking an id or a listing reference are dropped.
pub fn normalize_bids(raw: &Value) -> Result<Vec<Bid>> {
    let records = as_records(raw)?;
    let bids: Vec<Bid> = records.iter().filter_map(normalize_bid).collect();
    if bids.len() < records.len() {
        debug!(
            kept = bids.len(),
            dropped = records.len() - bids.len(),
            "dropped malformed bid records"
        );
    }
    Ok(bids)
}

/// Normalize a single raw bid record.
pub fn normalize_bid(record: &Value) -> Option<Bid> {
    let obj = record.as_object()?;
    Some(Bid {
        id: identifier(obj, &["id"])?,
        listing_id: identifier(obj, &["listing_id", "listingId", "coin_id", "coinId"])?,
        bidder_id: text(obj, &["bidder_id", "bidderId", "user_id"]),
        amount: number(obj, &["amount", "bid_amount"])
            .map(|a| a.max(0.0))
            .unwrap_or(0.0),
        created_at: timestamp(obj, &["created_at", "createdAt"]),
    })
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn as_records(raw: &Value) -> Result<&[Value]> {
    raw.as_array().map(Vec::as_slice).ok_or_else(|| {
        MarketError::InvalidArgument(format!(
            "expected a JSON array of records, got {}",
            kind_of(raw)
        ))
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// First non-null value among the given keys.
fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn identifier(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    match field(obj, keys)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text(obj: &Map<String, Value>, keys: &[&str]) -> String {
    match field(obj, keys) {
        Some(v) => scalar_text(v),
        None => String::new(),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        // Image galleries arrive as arrays; the first entry is the primary image.
        Value::Array(items) => items.first().map(scalar_text).unwrap_or_default(),
        _ => String::new(),
    }
}

fn number(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    let n = match field(obj, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn integer(obj: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    match field(obj, keys)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

fn counter(obj: &Map<String, Value>, keys: &[&str]) -> u64 {
    integer(obj, keys).map(|n| n.max(0) as u64).unwrap_or(0)
}

fn flag(obj: &Map<String, Value>, keys: &[&str]) -> bool {
    match field(obj, keys) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "t" | "yes" | "1"
        ),
        _ => false,
    }
}

fn timestamp(obj: &Map<String, Value>, keys: &[&str]) -> Option<DateTime<Utc>> {
    match field(obj, keys)? {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => {
            let secs = n.as_i64()?;
            // Millisecond epochs are common from JS clients.
            if secs.abs() > 100_000_000_000 {
                Utc.timestamp_millis_opt(secs).single()
            } else {
                Utc.timestamp_opt(secs, 0).single()
            }
        }
        _ => None,
    }
}

/// Parse RFC 3339, Postgres-style timestamps, bare datetimes and plain dates.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
