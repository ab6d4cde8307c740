//! Collaborator interfaces to the backend: where raw listings come from and
//! where validated bids go.

use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config;
use crate::error::{MarketError, Result};
use crate::models::NewBid;
use crate::rest_query::RestQuery;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Supplier of raw listing records.
pub trait ListingSource: Send + Sync {
    /// Fetch the full listing feed as a JSON array of flat records.
    fn fetch_listings(&self) -> Result<Value>;

    /// Fetch raw bid records for one listing, as a JSON array.
    fn fetch_bids(&self, _listing_id: &str) -> Result<Value> {
        Ok(Value::Array(Vec::new()))
    }
}

/// Persists validated bids. Concurrency control between competing bids is
/// the implementation's concern.
pub trait BidSink: Send + Sync {
    /// Persist a bid and return the stored record.
    fn submit(&self, bid: &NewBid) -> Result<Value>;
}

// ---------------------------------------------------------------------------
// StaticSource
// ---------------------------------------------------------------------------

/// In-memory source for fixtures and offline use.
///
/// Submitted bids are appended to its bid list, so they show up in later
/// [`fetch_bids`](ListingSource::fetch_bids) calls.
pub struct StaticSource {
    listings: Value,
    bids: Mutex<Vec<Value>>,
}

impl StaticSource {
    pub fn new(listings: Value) -> Self {
        Self {
            listings,
            bids: Mutex::new(Vec::new()),
        }
    }

    /// Seed the source with raw bid records.
    pub fn with_bids(self, bids: Vec<Value>) -> Self {
        Self {
            listings: self.listings,
            bids: Mutex::new(bids),
        }
    }
}

impl ListingSource for StaticSource {
    fn fetch_listings(&self) -> Result<Value> {
        Ok(self.listings.clone())
    }

    fn fetch_bids(&self, listing_id: &str) -> Result<Value> {
        let bids = self
            .bids
            .lock()
            .map_err(|_| MarketError::InvalidArgument("bid store lock poisoned".into()))?;
        let matching = bids
            .iter()
            .filter(|b| {
                b.get("listing_id")
                    .and_then(Value::as_str)
                    .is_some_and(|id| id == listing_id)
            })
            .cloned()
            .collect();
        Ok(Value::Array(matching))
    }
}

impl BidSink for StaticSource {
    fn submit(&self, bid: &NewBid) -> Result<Value> {
        let mut bids = self
            .bids
            .lock()
            .map_err(|_| MarketError::InvalidArgument("bid store lock poisoned".into()))?;
        let record = json!({
            "id": format!("local-{}", bids.len() + 1),
            "listing_id": bid.listing_id,
            "bidder_id": bid.bidder_id,
            "amount": bid.amount,
            "created_at": Utc::now().to_rfc3339(),
        });
        bids.push(record.clone());
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// RestSource
// ---------------------------------------------------------------------------

/// Listing source and bid sink backed by the backend's REST data API.
pub struct RestSource {
    base_url: String,
    api_key: Option<String>,
    client: Client,
    listings_table: String,
    bids_table: String,
    page_size: usize,
}

impl RestSource {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(MarketError::InvalidArgument(
                "backend base URL must not be empty".into(),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            base_url,
            api_key,
            client,
            listings_table: config::LISTINGS_TABLE.to_string(),
            bids_table: config::BIDS_TABLE.to_string(),
            page_size: config::PAGE_SIZE,
        })
    }

    /// Override the listings and bids table names.
    pub fn tables(mut self, listings: &str, bids: &str) -> Self {
        self.listings_table = listings.to_string();
        self.bids_table = bids.to_string();
        self
    }

    pub fn page_size(mut self, n: usize) -> Self {
        self.page_size = n.max(1);
        self
    }

    /// Full URL of a table endpoint.
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}/{}", self.base_url, config::REST_PREFIX, table)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => req
                .header("apikey", key.as_str())
                .header("Authorization", format!("Bearer {}", key)),
            None => req,
        }
    }

    fn get_rows(&self, query: &RestQuery) -> Result<Vec<Value>> {
        let (table, pairs) = query.build();
        let url = self.table_url(&table);
        debug!(%url, ?pairs, "GET");
        let resp = self
            .authorize(self.client.get(&url).query(&pairs))
            .send()?
            .error_for_status()?;
        match resp.json::<Value>()? {
            Value::Array(rows) => Ok(rows),
            other => Err(MarketError::InvalidArgument(format!(
                "expected an array from {}, got {}",
                url, other
            ))),
        }
    }
}

impl ListingSource for RestSource {
    fn fetch_listings(&self) -> Result<Value> {
        let mut all = Vec::new();
        let mut offset = 0;
        loop {
            let mut query = RestQuery::new(&self.listings_table);
            query
                .order_desc("created_at")
                .limit(self.page_size)
                .offset(offset);
            let page = self.get_rows(&query)?;
            let n = page.len();
            all.extend(page);
            if n < self.page_size {
                break;
            }
            offset += n;
        }
        info!(count = all.len(), table = %self.listings_table, "fetched listing feed");
        Ok(Value::Array(all))
    }

    fn fetch_bids(&self, listing_id: &str) -> Result<Value> {
        let mut query = RestQuery::new(&self.bids_table);
        query.eq("listing_id", listing_id).order_desc("amount");
        Ok(Value::Array(self.get_rows(&query)?))
    }
}

impl BidSink for RestSource {
    fn submit(&self, bid: &NewBid) -> Result<Value> {
        let url = self.table_url(&self.bids_table);
        let resp = self
            .authorize(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(bid)
            .send()?
            .error_for_status()?;
        // PostgREST answers inserts with an array of the stored rows.
        match resp.json::<Value>()? {
            Value::Array(mut rows) if !rows.is_empty() => Ok(rows.swap_remove(0)),
            other => Ok(other),
        }
    }
}
