//! Relevance scoring and sort orders.

mod common;

use std::str::FromStr;

use coin_market_sdk::models::Listing;
use coin_market_sdk::pipeline::rank::{self, relevance_score, SortKey};
use coin_market_sdk::MarketError;

fn ranked_ids(key: SortKey) -> Vec<String> {
    let listings = common::sample_listings();
    rank::rank(&listings, None, key)
        .into_iter()
        .map(|s| s.listing.id)
        .collect()
}

// ---------------------------------------------------------------------------
// relevance_score
// ---------------------------------------------------------------------------

#[test]
fn name_match_outranks_description_match() {
    let by_name = common::listing("a", "1921 Morgan Silver Dollar", "");
    let by_description = common::listing("b", "Peace Dollar", "Often confused with the Morgan design");

    let a = relevance_score(&by_name, Some("morgan"));
    let b = relevance_score(&by_description, Some("morgan"));
    assert_eq!(a, rank::NAME_MATCH);
    assert_eq!(b, rank::DESCRIPTION_MATCH);
    assert!(a > b);
}

#[test]
fn field_weights_add_up() {
    let mut l = common::listing("c", "Greece 1821 drachma", "Struck in Greece");
    l.country = "Greece".into();
    l.year = 1821;

    assert_eq!(
        relevance_score(&l, Some("greece")),
        rank::NAME_MATCH + rank::DESCRIPTION_MATCH + rank::COUNTRY_MATCH
    );
    assert_eq!(
        relevance_score(&l, Some("1821")),
        rank::NAME_MATCH + rank::YEAR_MATCH
    );
}

#[test]
fn bonuses_apply_without_query() {
    let coin = common::sample_listing("coin-001");
    assert_eq!(
        relevance_score(&coin, None),
        rank::FEATURED_BONUS + rank::IMAGE_BONUS + rank::GRADE_BONUS
    );
    assert_eq!(relevance_score(&coin, Some("   ")), relevance_score(&coin, None));
}

#[test]
fn query_is_case_insensitive() {
    let coin = common::sample_listing("coin-001");
    assert_eq!(
        relevance_score(&coin, Some("MORGAN")),
        relevance_score(&coin, Some("morgan"))
    );
}

#[test]
fn unknown_year_never_scores() {
    let mut l = Listing::new("u");
    l.year = 0;
    assert_eq!(relevance_score(&l, Some("0")), 0);
}

// ---------------------------------------------------------------------------
// Sort keys
// ---------------------------------------------------------------------------

#[test]
fn relevance_without_query_orders_by_bonuses_then_input() {
    assert_eq!(
        ranked_ids(SortKey::Relevance),
        vec!["coin-001", "coin-004", "coin-003", "coin-002", "note-005", "42"]
    );
}

#[test]
fn price_orders() {
    assert_eq!(
        ranked_ids(SortKey::PriceLow),
        vec!["coin-004", "coin-001", "note-005", "42", "coin-002", "coin-003"]
    );
    assert_eq!(
        ranked_ids(SortKey::PriceHigh),
        vec!["coin-003", "coin-002", "42", "note-005", "coin-001", "coin-004"]
    );
}

#[test]
fn year_orders() {
    assert_eq!(
        ranked_ids(SortKey::YearOld),
        vec!["coin-002", "42", "note-005", "coin-001", "coin-004", "coin-003"]
    );
    assert_eq!(
        ranked_ids(SortKey::YearNew),
        vec!["coin-003", "coin-004", "coin-001", "note-005", "42", "coin-002"]
    );
}

#[test]
fn popularity_orders_by_views() {
    assert_eq!(
        ranked_ids(SortKey::Popularity),
        vec!["coin-001", "coin-002", "coin-004", "coin-003", "note-005", "42"]
    );
}

#[test]
fn recently_added_puts_unknown_dates_last() {
    assert_eq!(
        ranked_ids(SortKey::RecentlyAdded),
        vec!["coin-003", "coin-001", "coin-002", "coin-004", "note-005", "42"]
    );
}

#[test]
fn equal_keys_keep_input_order() {
    let listings: Vec<Listing> = ["x", "y", "z"]
        .iter()
        .map(|id| {
            let mut l = Listing::new(*id);
            l.price = 10.0;
            l
        })
        .collect();
    for key in SortKey::ALL {
        let ids: Vec<String> = rank::rank(&listings, None, key)
            .into_iter()
            .map(|s| s.listing.id)
            .collect();
        assert_eq!(ids, vec!["x", "y", "z"], "key {}", key);
    }
}

#[test]
fn rank_is_a_permutation_and_leaves_input_untouched() {
    let listings = common::sample_listings();
    let before = listings.clone();
    for key in SortKey::ALL {
        let mut ids: Vec<String> = rank::rank(&listings, Some("silver"), key)
            .into_iter()
            .map(|s| s.listing.id)
            .collect();
        ids.sort();
        let mut expected: Vec<String> = listings.iter().map(|l| l.id.clone()).collect();
        expected.sort();
        assert_eq!(ids, expected);
    }
    assert_eq!(listings, before);
}

#[test]
fn rank_carries_scores() {
    let listings = common::sample_listings();
    let ranked = rank::rank(&listings, Some("morgan"), SortKey::Relevance);
    assert_eq!(ranked[0].listing.id, "coin-001");
    assert_eq!(
        ranked[0].score,
        rank::NAME_MATCH + rank::FEATURED_BONUS + rank::IMAGE_BONUS + rank::GRADE_BONUS
    );
    assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
}

// ---------------------------------------------------------------------------
// SortKey parsing
// ---------------------------------------------------------------------------

#[test]
fn sort_key_round_trips_through_its_label() {
    for key in SortKey::ALL {
        assert_eq!(SortKey::from_str(key.as_str()).unwrap(), key);
    }
    assert_eq!(SortKey::from_str("Price-High").unwrap(), SortKey::PriceHigh);
}

#[test]
fn blank_sort_key_is_relevance() {
    assert_eq!(SortKey::from_str("").unwrap(), SortKey::Relevance);
    assert_eq!(SortKey::default(), SortKey::Relevance);
}

#[test]
fn unknown_sort_key_is_rejected() {
    let err = SortKey::from_str("cheapest").unwrap_err();
    assert!(matches!(err, MarketError::InvalidArgument(_)));
}

#[test]
fn sort_key_serde_uses_kebab_case() {
    let json = serde_json::to_string(&SortKey::RecentlyAdded).unwrap();
    assert_eq!(json, "\"recently-added\"");
    let key: SortKey = serde_json::from_str("\"year-old\"").unwrap();
    assert_eq!(key, SortKey::YearOld);
}
