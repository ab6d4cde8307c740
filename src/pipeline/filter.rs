//! Filter stage: conjunction of independent listing predicates.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::Listing;
use crate::pipeline::category::{self, CategoryClassifier, Predicate};

/// Query tokens must be longer than this to match on their own.
const MIN_TOKEN_LEN: usize = 2;

// ---------------------------------------------------------------------------
// FilterCriteria
// ---------------------------------------------------------------------------

/// Filter configuration for a listing search.
///
/// All fields are optional. When `None`, the corresponding filter is skipped.
/// Boolean flags only constrain when set to `Some(true)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub query: Option<String>,
    pub price_range: Option<(f64, f64)>,
    /// Inclusive; listings with an unknown year never match.
    pub year_range: Option<(i32, i32)>,
    pub country: Option<String>,
    pub rarity: Option<String>,
    pub condition: Option<String>,
    pub has_image: Option<bool>,
    pub is_auction: Option<bool>,
    pub has_grading: Option<bool>,
    pub category: Option<String>,
    pub seller_id: Option<String>,
    pub featured_only: Option<bool>,
}

impl FilterCriteria {
    /// Non-blank free-text query, if any.
    pub fn text_query(&self) -> Option<&str> {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }

    /// True when no criterion constrains the result.
    pub fn is_unconstrained(&self) -> bool {
        let flag = |f: Option<bool>| f != Some(true);
        self.text_query().is_none()
            && self.price_range.is_none()
            && self.year_range.is_none()
            && self.country.is_none()
            && self.rarity.is_none()
            && self.condition.is_none()
            && flag(self.has_image)
            && flag(self.is_auction)
            && flag(self.has_grading)
            && self
                .category
                .as_deref()
                .map_or(true, |c| c.trim().eq_ignore_ascii_case(category::ALL))
            && self.seller_id.is_none()
            && flag(self.featured_only)
    }

    /// Feed every criterion into a hasher; float bounds hash by bit pattern.
    pub(crate) fn hash_into<H: Hasher>(&self, state: &mut H) {
        self.query.hash(state);
        self.price_range
            .map(|(lo, hi)| (lo.to_bits(), hi.to_bits()))
            .hash(state);
        self.year_range.hash(state);
        self.country.hash(state);
        self.rarity.hash(state);
        self.condition.hash(state);
        self.has_image.hash(state);
        self.is_auction.hash(state);
        self.has_grading.hash(state);
        self.category.hash(state);
        self.seller_id.hash(state);
        self.featured_only.hash(state);
    }
}

// ---------------------------------------------------------------------------
// ListingFilter
// ---------------------------------------------------------------------------

enum CategoryRule {
    Any,
    Known(Predicate),
    Unknown,
}

/// Criteria prepared for repeated evaluation: the query is lowercased and
/// tokenized and the category predicate resolved once.
pub struct ListingFilter<'c> {
    criteria: &'c FilterCriteria,
    query: Option<String>,
    tokens: Vec<String>,
    category: CategoryRule,
}

impl<'c> ListingFilter<'c> {
    pub fn new(criteria: &'c FilterCriteria, classifier: &CategoryClassifier) -> Self {
        let query = criteria.text_query().map(str::to_lowercase);
        let tokens = query
            .as_deref()
            .map(|q| {
                q.split_whitespace()
                    .filter(|t| t.chars().count() > MIN_TOKEN_LEN)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let category = match criteria.category.as_deref().map(str::trim) {
            None | Some("") => CategoryRule::Any,
            Some(tag) if tag.eq_ignore_ascii_case(category::ALL) => CategoryRule::Any,
            Some(tag) => match classifier.predicate(tag) {
                Some(p) => CategoryRule::Known(p),
                None => {
                    warn!(category = tag, "unknown category tag; no listing will match");
                    CategoryRule::Unknown
                }
            },
        };

        Self {
            criteria,
            query,
            tokens,
            category,
        }
    }

    /// Evaluate every active criterion against one listing.
    pub fn matches(&self, listing: &Listing) -> bool {
        let c = self.criteria;

        if let Some(ref q) = self.query {
            if !self.matches_query(q, listing) {
                return false;
            }
        }

        if let Some((min, max)) = c.price_range {
            if !(listing.price >= min && listing.price <= max) {
                return false;
            }
        }

        if let Some((min, max)) = c.year_range {
            if !listing.has_known_year() || !(listing.year >= min && listing.year <= max) {
                return false;
            }
        }

        if let Some(ref country) = c.country {
            if listing.country != *country {
                return false;
            }
        }

        if let Some(ref rarity) = c.rarity {
            if listing.rarity.as_str() != rarity {
                return false;
            }
        }

        if let Some(ref condition) = c.condition {
            if listing.condition != *condition {
                return false;
            }
        }

        if c.has_image == Some(true) && !listing.has_image() {
            return false;
        }

        if c.is_auction == Some(true) && !listing.is_auction {
            return false;
        }

        if c.has_grading == Some(true) && !listing.has_grade() {
            return false;
        }

        if let Some(ref seller) = c.seller_id {
            if listing.seller_id != *seller {
                return false;
            }
        }

        if c.featured_only == Some(true) && !listing.featured {
            return false;
        }

        match &self.category {
            CategoryRule::Any => true,
            CategoryRule::Known(p) => p(listing),
            CategoryRule::Unknown => false,
        }
    }

    fn matches_query(&self, query: &str, listing: &Listing) -> bool {
        let haystack = searchable_text(listing);
        haystack.contains(query) || self.tokens.iter().any(|t| haystack.contains(t.as_str()))
    }
}

/// Lowercased concatenation of the fields a free-text query searches.
fn searchable_text(listing: &Listing) -> String {
    let year = if listing.has_known_year() {
        listing.year.to_string()
    } else {
        String::new()
    };
    [
        listing.name.as_str(),
        listing.country.as_str(),
        listing.description.as_str(),
        year.as_str(),
        listing.rarity.as_str(),
        listing.condition.as_str(),
    ]
    .join(" ")
    .to_lowercase()
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Keep the listings that satisfy every active criterion, in input order.
pub fn filter_listings<'a, I>(
    listings: I,
    criteria: &FilterCriteria,
    classifier: &CategoryClassifier,
) -> Vec<&'a Listing>
where
    I: IntoIterator<Item = &'a Listing>,
{
    let filter = ListingFilter::new(criteria, classifier);
    listings.into_iter().filter(|l| filter.matches(l)).collect()
}

/// Count the listings that satisfy every active criterion.
pub fn count_matching(
    listings: &[Listing],
    criteria: &FilterCriteria,
    classifier: &CategoryClassifier,
) -> usize {
    let filter = ListingFilter::new(criteria, classifier);
    listings.iter().filter(|l| filter.matches(l)).count()
}
