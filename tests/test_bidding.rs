//! Bid validation rules.

mod common;

use chrono::{Duration, TimeZone, Utc};
use coin_market_sdk::bidding::{current_highest, prepare_bid, validate_bid, validate_for_listing};
use coin_market_sdk::MarketError;

fn is_invalid_bid<T: std::fmt::Debug>(result: coin_market_sdk::Result<T>) -> bool {
    matches!(result, Err(MarketError::InvalidBid(_)))
}

// ---------------------------------------------------------------------------
// validate_bid
// ---------------------------------------------------------------------------

#[test]
fn bid_must_exceed_current_highest() {
    assert!(validate_bid(101.0, 100.0).is_ok());
    assert!(is_invalid_bid(validate_bid(100.0, 100.0)));
    assert!(is_invalid_bid(validate_bid(99.99, 100.0)));
}

#[test]
fn bid_must_be_positive_and_finite() {
    assert!(is_invalid_bid(validate_bid(0.0, 0.0)));
    assert!(is_invalid_bid(validate_bid(-5.0, 0.0)));
    assert!(is_invalid_bid(validate_bid(f64::NAN, 0.0)));
    assert!(is_invalid_bid(validate_bid(f64::INFINITY, 0.0)));
    assert!(validate_bid(0.01, 0.0).is_ok());
}

#[test]
fn rejection_message_names_the_amounts() {
    let err = validate_bid(50.0, 75.5).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("50.00"), "{}", msg);
    assert!(msg.contains("75.50"), "{}", msg);
}

// ---------------------------------------------------------------------------
// current_highest
// ---------------------------------------------------------------------------

#[test]
fn current_bid_takes_precedence_over_price() {
    let tetradrachm = common::sample_listing("coin-002");
    assert_eq!(current_highest(&tetradrachm), 1350.0);

    let note = common::sample_listing("note-005");
    assert_eq!(current_highest(&note), 50.0);

    let mut zero_bid = common::sample_listing("coin-002");
    zero_bid.current_bid = Some(0.0);
    assert_eq!(current_highest(&zero_bid), 1200.0);
}

// ---------------------------------------------------------------------------
// validate_for_listing
// ---------------------------------------------------------------------------

#[test]
fn open_auction_accepts_higher_bid() {
    let tetradrachm = common::sample_listing("coin-002");
    let now = Utc::now();
    assert!(validate_for_listing(&tetradrachm, 1350.01, now).is_ok());
    assert!(is_invalid_bid(validate_for_listing(&tetradrachm, 1350.0, now)));
    assert!(is_invalid_bid(validate_for_listing(&tetradrachm, 1300.0, now)));
}

#[test]
fn fixed_price_listing_rejects_bids() {
    let morgan = common::sample_listing("coin-001");
    assert!(is_invalid_bid(validate_for_listing(&morgan, 1000.0, Utc::now())));
}

#[test]
fn ended_auction_rejects_bids() {
    let note = common::sample_listing("note-005");
    assert!(is_invalid_bid(validate_for_listing(&note, 1000.0, Utc::now())));

    let before_end = Utc.with_ymd_and_hms(2019, 12, 31, 0, 0, 0).unwrap();
    assert!(validate_for_listing(&note, 51.0, before_end).is_ok());
}

#[test]
fn auction_closes_at_its_end_time() {
    let mut l = common::sample_listing("coin-002");
    let end = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
    l.auction_end = Some(end);

    assert!(validate_for_listing(&l, 5000.0, end - Duration::seconds(1)).is_ok());
    assert!(is_invalid_bid(validate_for_listing(&l, 5000.0, end)));
}

#[test]
fn auction_without_end_time_stays_open() {
    let mut l = common::sample_listing("coin-002");
    l.auction_end = None;
    assert!(validate_for_listing(&l, 5000.0, Utc::now()).is_ok());
}

// ---------------------------------------------------------------------------
// prepare_bid
// ---------------------------------------------------------------------------

#[test]
fn prepare_bid_packages_valid_bid() {
    let tetradrachm = common::sample_listing("coin-002");
    let bid = prepare_bid(&tetradrachm, "  user-c ", 1400.0, Utc::now()).unwrap();
    assert_eq!(bid.listing_id, "coin-002");
    assert_eq!(bid.bidder_id, "user-c");
    assert_eq!(bid.amount, 1400.0);
}

#[test]
fn prepare_bid_requires_bidder() {
    let tetradrachm = common::sample_listing("coin-002");
    let err = prepare_bid(&tetradrachm, " ", 1400.0, Utc::now()).unwrap_err();
    assert!(matches!(err, MarketError::InvalidArgument(_)));
}

#[test]
fn validation_does_not_mutate_listing() {
    let tetradrachm = common::sample_listing("coin-002");
    let before = tetradrachm.clone();
    let _ = prepare_bid(&tetradrachm, "user-c", 9999.0, Utc::now());
    assert_eq!(tetradrachm, before);
}
