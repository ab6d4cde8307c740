//! Relevance scoring and ordering.
//!
//! Scoring is a pure map over the filtered set; ordering is a separate stable
//! sort over the scored pairs. Equal sort keys keep their input order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MarketError;
use crate::models::Listing;

pub const NAME_MATCH: u32 = 100;
pub const DESCRIPTION_MATCH: u32 = 50;
pub const YEAR_MATCH: u32 = 75;
pub const COUNTRY_MATCH: u32 = 60;
pub const FEATURED_BONUS: u32 = 25;
pub const IMAGE_BONUS: u32 = 10;
pub const GRADE_BONUS: u32 = 15;

// ---------------------------------------------------------------------------
// SortKey
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Relevance score, highest first.
    #[default]
    Relevance,
    PriceLow,
    PriceHigh,
    YearOld,
    YearNew,
    /// Views, highest first.
    Popularity,
    /// Creation time, newest first; listings without one sort last.
    RecentlyAdded,
}

impl SortKey {
    pub const ALL: [SortKey; 7] = [
        SortKey::Relevance,
        SortKey::PriceLow,
        SortKey::PriceHigh,
        SortKey::YearOld,
        SortKey::YearNew,
        SortKey::Popularity,
        SortKey::RecentlyAdded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Relevance => "relevance",
            SortKey::PriceLow => "price-low",
            SortKey::PriceHigh => "price-high",
            SortKey::YearOld => "year-old",
            SortKey::YearNew => "year-new",
            SortKey::Popularity => "popularity",
            SortKey::RecentlyAdded => "recently-added",
        }
    }

    /// Compare two scored listings under this key.
    fn compare(&self, a: &(&Listing, u32), b: &(&Listing, u32)) -> Ordering {
        let (la, sa) = a;
        let (lb, sb) = b;
        match self {
            SortKey::Relevance => sb.cmp(sa),
            SortKey::PriceLow => la.price.total_cmp(&lb.price),
            SortKey::PriceHigh => lb.price.total_cmp(&la.price),
            SortKey::YearOld => la.year.cmp(&lb.year),
            SortKey::YearNew => lb.year.cmp(&la.year),
            SortKey::Popularity => lb.views.cmp(&la.views),
            // `None < Some`, so reversing puts unknown creation times last.
            SortKey::RecentlyAdded => lb.created_at.cmp(&la.created_at),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(SortKey::default());
        }
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| MarketError::InvalidArgument(format!("Unknown sort key: {}", s)))
    }
}

// ---------------------------------------------------------------------------
// ScoredListing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredListing {
    pub listing: Listing,
    pub score: u32,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Additive relevance score of a listing for a free-text query.
///
/// The featured, image and grade bonuses apply with or without a query.
pub fn relevance_score(listing: &Listing, query: Option<&str>) -> u32 {
    let query = normalize_query(query);
    score_with(listing, query.as_deref())
}

fn normalize_query(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
}

fn score_with(listing: &Listing, query: Option<&str>) -> u32 {
    let mut score = 0;

    if let Some(q) = query {
        if listing.name.to_lowercase().contains(q) {
            score += NAME_MATCH;
        }
        if listing.description.to_lowercase().contains(q) {
            score += DESCRIPTION_MATCH;
        }
        if listing.has_known_year() && listing.year.to_string().contains(q) {
            score += YEAR_MATCH;
        }
        if listing.country.to_lowercase().contains(q) {
            score += COUNTRY_MATCH;
        }
    }

    if listing.featured {
        score += FEATURED_BONUS;
    }
    if listing.has_image() {
        score += IMAGE_BONUS;
    }
    if listing.has_grade() {
        score += GRADE_BONUS;
    }

    score
}

/// Pair every listing with its relevance score, preserving input order.
pub fn score_listings<'a, I>(listings: I, query: Option<&str>) -> Vec<(&'a Listing, u32)>
where
    I: IntoIterator<Item = &'a Listing>,
{
    let query = normalize_query(query);
    listings
        .into_iter()
        .map(|l| (l, score_with(l, query.as_deref())))
        .collect()
}

/// Stable sort of scored listings by the given key.
pub fn sort_scored(scored: &mut [(&Listing, u32)], key: SortKey) {
    scored.sort_by(|a, b| key.compare(a, b));
}

/// Score then order a listing set. The input is never modified.
pub fn rank<'a, I>(listings: I, query: Option<&str>, key: SortKey) -> Vec<ScoredListing>
where
    I: IntoIterator<Item = &'a Listing>,
{
    let mut scored = score_listings(listings, query);
    sort_scored(&mut scored, key);
    scored
        .into_iter()
        .map(|(listing, score)| ScoredListing {
            listing: listing.clone(),
            score,
        })
        .collect()
}
