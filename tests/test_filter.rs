//! Filter stage: each criterion on its own, then in combination.

mod common;

use coin_market_sdk::models::Listing;
use coin_market_sdk::pipeline::filter::{count_matching, filter_listings};
use coin_market_sdk::{CategoryClassifier, FilterCriteria};

fn ids(criteria: &FilterCriteria) -> Vec<String> {
    let listings = common::sample_listings();
    let classifier = CategoryClassifier::standard();
    filter_listings(&listings, criteria, &classifier)
        .into_iter()
        .map(|l| l.id.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Unconstrained
// ---------------------------------------------------------------------------

#[test]
fn default_criteria_keep_everything_in_order() {
    let criteria = FilterCriteria::default();
    assert!(criteria.is_unconstrained());
    assert_eq!(
        ids(&criteria),
        vec!["coin-001", "coin-002", "coin-003", "coin-004", "note-005", "42"]
    );
}

#[test]
fn blank_query_and_all_category_are_unconstrained() {
    let criteria = FilterCriteria {
        query: Some("   ".into()),
        category: Some("All".into()),
        has_image: Some(false),
        ..Default::default()
    };
    assert!(criteria.is_unconstrained());
    assert_eq!(ids(&criteria).len(), 6);
}

#[test]
fn empty_input_gives_empty_output() {
    let classifier = CategoryClassifier::standard();
    let criteria = FilterCriteria {
        query: Some("morgan".into()),
        ..Default::default()
    };
    let none: Vec<Listing> = Vec::new();
    assert!(filter_listings(&none, &criteria, &classifier).is_empty());
}

// ---------------------------------------------------------------------------
// Free-text query
// ---------------------------------------------------------------------------

#[test]
fn query_matches_name_case_insensitively() {
    let criteria = FilterCriteria {
        query: Some("MORGAN".into()),
        ..Default::default()
    };
    assert_eq!(ids(&criteria), vec!["coin-001"]);
}

#[test]
fn query_matches_description_country_and_year() {
    let by_description = FilterCriteria {
        query: Some("athens".into()),
        ..Default::default()
    };
    assert_eq!(ids(&by_description), vec!["coin-002"]);

    let by_country = FilterCriteria {
        query: Some("south africa".into()),
        ..Default::default()
    };
    assert_eq!(ids(&by_country), vec!["coin-003"]);

    let by_year = FilterCriteria {
        query: Some("1910".into()),
        ..Default::default()
    };
    assert_eq!(ids(&by_year), vec!["note-005"]);
}

#[test]
fn any_long_token_is_enough() {
    // Neither listing contains the whole phrase.
    let criteria = FilterCriteria {
        query: Some("krugerrand tetradrachm".into()),
        ..Default::default()
    };
    assert_eq!(ids(&criteria), vec!["coin-002", "coin-003"]);
}

#[test]
fn short_tokens_do_not_match_alone() {
    // "of" and "an" are too short; "zzz" matches nothing.
    let criteria = FilterCriteria {
        query: Some("of an zzz".into()),
        ..Default::default()
    };
    assert!(ids(&criteria).is_empty());
}

#[test]
fn query_does_not_search_composition() {
    let criteria = FilterCriteria {
        query: Some("91.67%".into()),
        ..Default::default()
    };
    assert!(ids(&criteria).is_empty());
}

// ---------------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------------

#[test]
fn price_range_is_inclusive() {
    let criteria = FilterCriteria {
        price_range: Some((10.0, 50.0)),
        ..Default::default()
    };
    assert_eq!(ids(&criteria), vec!["coin-001", "coin-004", "note-005"]);
}

#[test]
fn inverted_price_range_matches_nothing() {
    let criteria = FilterCriteria {
        price_range: Some((100.0, 10.0)),
        ..Default::default()
    };
    assert!(ids(&criteria).is_empty());
}

#[test]
fn year_range_handles_negative_years() {
    let modern = FilterCriteria {
        year_range: Some((1900, 2000)),
        ..Default::default()
    };
    assert_eq!(ids(&modern), vec!["coin-001", "coin-003", "coin-004", "note-005"]);

    let antiquity = FilterCriteria {
        year_range: Some((-500, 0)),
        ..Default::default()
    };
    assert_eq!(ids(&antiquity), vec!["coin-002"]);
}

#[test]
fn year_range_excludes_undated_listings() {
    let undated = Listing::new("undated");
    let mut dated = Listing::new("dated");
    dated.year = 50;
    let listings = vec![undated, dated];

    let criteria = FilterCriteria {
        year_range: Some((-100, 100)),
        ..Default::default()
    };
    let kept = filter_listings(&listings, &criteria, &CategoryClassifier::standard());
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].id, "dated");
}

// ---------------------------------------------------------------------------
// Exact-match fields
// ---------------------------------------------------------------------------

#[test]
fn country_condition_and_rarity_match_exactly() {
    let country = FilterCriteria {
        country: Some("United States".into()),
        ..Default::default()
    };
    assert_eq!(ids(&country), vec!["coin-001", "coin-004"]);

    let condition = FilterCriteria {
        condition: Some("VF".into()),
        ..Default::default()
    };
    assert_eq!(ids(&condition), vec!["coin-001", "note-005"]);

    let rarity = FilterCriteria {
        rarity: Some("Ultra Rare".into()),
        ..Default::default()
    };
    assert_eq!(ids(&rarity), vec!["note-005"]);

    let lowercase = FilterCriteria {
        country: Some("united states".into()),
        ..Default::default()
    };
    assert!(ids(&lowercase).is_empty());
}

#[test]
fn seller_filter() {
    let criteria = FilterCriteria {
        seller_id: Some("store-1".into()),
        ..Default::default()
    };
    assert_eq!(ids(&criteria), vec!["coin-001", "coin-003"]);
}

// ---------------------------------------------------------------------------
// Boolean flags
// ---------------------------------------------------------------------------

#[test]
fn boolean_flags_constrain_only_when_true() {
    let images = FilterCriteria {
        has_image: Some(true),
        ..Default::default()
    };
    assert_eq!(ids(&images), vec!["coin-001", "coin-003"]);

    let auctions = FilterCriteria {
        is_auction: Some(true),
        ..Default::default()
    };
    assert_eq!(ids(&auctions), vec!["coin-002", "note-005"]);

    let graded = FilterCriteria {
        has_grading: Some(true),
        ..Default::default()
    };
    assert_eq!(ids(&graded), vec!["coin-001", "coin-004"]);

    let featured = FilterCriteria {
        featured_only: Some(true),
        ..Default::default()
    };
    assert_eq!(ids(&featured), vec!["coin-001"]);

    let not_auctions = FilterCriteria {
        is_auction: Some(false),
        ..Default::default()
    };
    assert_eq!(ids(&not_auctions).len(), 6);
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[test]
fn category_filter_uses_classifier() {
    let criteria = FilterCriteria {
        category: Some("european".into()),
        ..Default::default()
    };
    assert_eq!(ids(&criteria), vec!["coin-002", "note-005"]);
}

#[test]
fn category_tag_is_case_insensitive() {
    let criteria = FilterCriteria {
        category: Some(" ANCIENT ".into()),
        ..Default::default()
    };
    assert_eq!(ids(&criteria), vec!["coin-002"]);
}

#[test]
fn unknown_category_matches_nothing() {
    let criteria = FilterCriteria {
        category: Some("space-coins".into()),
        ..Default::default()
    };
    assert!(!criteria.is_unconstrained());
    assert!(ids(&criteria).is_empty());
}

// ---------------------------------------------------------------------------
// Conjunction
// ---------------------------------------------------------------------------

#[test]
fn criteria_combine_as_conjunction() {
    let country = FilterCriteria {
        country: Some("United States".into()),
        ..Default::default()
    };
    let price = FilterCriteria {
        price_range: Some((0.0, 20.0)),
        ..Default::default()
    };
    let both = FilterCriteria {
        country: Some("United States".into()),
        price_range: Some((0.0, 20.0)),
        ..Default::default()
    };

    let a = ids(&country);
    let b = ids(&price);
    let expected: Vec<String> = a.iter().filter(|id| b.contains(id)).cloned().collect();
    assert_eq!(ids(&both), expected);
    assert_eq!(ids(&both), vec!["coin-004"]);
}

#[test]
fn count_matches_filter_length() {
    let listings = common::sample_listings();
    let classifier = CategoryClassifier::standard();
    let criteria = FilterCriteria {
        year_range: Some((1900, 2000)),
        has_image: Some(true),
        ..Default::default()
    };
    assert_eq!(
        count_matching(&listings, &criteria, &classifier),
        filter_listings(&listings, &criteria, &classifier).len()
    );
    assert_eq!(count_matching(&listings, &criteria, &classifier), 2);
}

#[test]
fn filter_results_are_a_subset_of_input() {
    let listings = common::sample_listings();
    let classifier = CategoryClassifier::standard();
    let criteria = FilterCriteria {
        query: Some("silver".into()),
        ..Default::default()
    };
    let out = filter_listings(&listings, &criteria, &classifier);
    assert!(out.iter().all(|l| listings.iter().any(|x| x.id == l.id)));
    assert!(out.len() <= listings.len());
}
