//! Shared test fixtures for the marketplace SDK integration tests.
//!
//! Provides `sample_feed()`, a small raw listing feed shaped like the
//! backend's rows (string numerics, camelCase aliases, malformed records),
//! and `setup_sample_sdk()` which builds a `MarketSdk` over it.

#![allow(dead_code)]

use coin_market_sdk::models::Listing;
use coin_market_sdk::pipeline::loader;
use coin_market_sdk::{MarketSdk, StaticSource};
use serde_json::{json, Value};

/// Raw listing feed: six usable records and two without an identifier.
///
/// Feed order is `coin-001`, `coin-002`, `coin-003`, `coin-004`, `note-005`, `42`.
pub fn sample_feed() -> Value {
    json!([
        {
            "id": "coin-001",
            "name": "1921 Morgan Silver Dollar",
            "description": "Classic American silver dollar",
            "country": "United States",
            "year": 1921,
            "denomination": "1 Dollar",
            "composition": "90% Silver",
            "condition": "VF",
            "grade": "MS-63",
            "rarity": "Common",
            "pcgs_number": "12345678",
            "price": "45.00",
            "is_auction": false,
            "image_url": "https://img.example/1.jpg",
            "views": 120,
            "featured": true,
            "seller_id": "store-1",
            "created_at": "2024-03-01T10:00:00Z"
        },
        {
            "id": "coin-002",
            "name": "Athenian Tetradrachm",
            "description": "Owl tetradrachm from ancient Athens",
            "country": "Greece",
            "year": -440,
            "composition": "Silver",
            "condition": "Fine",
            "rarity": "Rare",
            "ngcNumber": "NGC-4411",
            "price": 1200,
            "isAuction": true,
            "currentBid": 1350,
            "auctionEnd": "2999-01-01T00:00:00Z",
            "views": 75,
            "sellerId": "store-2",
            "createdAt": "2024-01-15 08:30:00+00"
        },
        {
            "id": "coin-003",
            "name": "Krugerrand",
            "country": "South Africa",
            "year": "1974",
            "composition": "Gold (91.67%)",
            "rarity": "uncommon",
            "price": 2100,
            "image": "https://img.example/3.jpg",
            "views": 10,
            "seller_id": "store-1",
            "created_at": "2024-05-20T12:00:00Z"
        },
        {
            "id": "coin-004",
            "name": "Lincoln Cent Doubled Die",
            "description": "1955 doubled die obverse",
            "country": "United States",
            "year": 1955,
            "category": "Error Coins",
            "grade": "AU-58",
            "price": 10,
            "views": "30",
            "seller_id": "store-3",
            "created_at": 1700000000
        },
        {
            "id": "note-005",
            "name": "Reichsbanknote 1000 Mark",
            "description": "Imperial German banknote",
            "kind": "banknote",
            "country": "Germany",
            "year": 1910,
            "condition": "VF",
            "rarity": "ultra rare",
            "price": 50,
            "is_auction": "true",
            "current_bid": null,
            "auction_end": "2020-01-01T00:00:00Z",
            "views": 5,
            "seller_id": "store-2"
        },
        { "name": "Listing without an id", "price": 5 },
        { "id": "   ", "name": "Blank id" },
        {
            "id": 42,
            "name": "Byzantine Follis",
            "country": "Turkey",
            "year": "1050",
            "price": 200
        }
    ])
}

/// The sample feed, normalized.
pub fn sample_listings() -> Vec<Listing> {
    loader::normalize(&sample_feed()).unwrap()
}

/// Look up one normalized sample listing by id.
pub fn sample_listing(id: &str) -> Listing {
    sample_listings()
        .into_iter()
        .find(|l| l.id == id)
        .unwrap_or_else(|| panic!("no sample listing {}", id))
}

/// Raw bid records for the auctions in the sample feed.
pub fn sample_bids() -> Vec<Value> {
    vec![
        json!({"id": "bid-1", "listing_id": "coin-002", "bidder_id": "user-a", "amount": 1250, "created_at": "2024-02-01T09:00:00Z"}),
        json!({"id": "bid-2", "listing_id": "coin-002", "bidder_id": "user-b", "amount": "1350.00", "created_at": "2024-02-02T09:00:00Z"}),
        json!({"id": "bid-3", "listingId": "note-005", "bidderId": "user-a", "amount": 60}),
    ]
}

/// Create a `MarketSdk` over the sample feed, with a temporary cache directory.
///
/// Returns `(MarketSdk, tempfile::TempDir)`. The caller must keep the `TempDir`
/// alive for the duration of the test so the cache directory is not deleted
/// prematurely.
pub fn setup_sample_sdk() -> (MarketSdk, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let source = StaticSource::new(sample_feed()).with_bids(sample_bids());
    let sdk = MarketSdk::builder()
        .cache_dir(tmp_dir.path())
        .source_and_sink(source)
        .build()
        .unwrap();
    (sdk, tmp_dir)
}

/// A bare listing with the given name and description.
pub fn listing(id: &str, name: &str, description: &str) -> Listing {
    let mut l = Listing::new(id);
    l.name = name.to_string();
    l.description = description.to_string();
    l
}
