use std::collections::BTreeSet;

use crate::models::{Listing, ListingFacets};

/// Summarize a listing set for building filter controls.
pub fn compute_facets(listings: &[Listing]) -> ListingFacets {
    let mut countries = BTreeSet::new();
    let mut conditions = BTreeSet::new();
    let mut rarities = BTreeSet::new();
    let mut price_range: Option<(f64, f64)> = None;
    let mut year_range: Option<(i32, i32)> = None;
    let mut auctions = 0;

    for l in listings {
        if !l.country.is_empty() {
            countries.insert(l.country.clone());
        }
        if !l.condition.is_empty() {
            conditions.insert(l.condition.clone());
        }
        if !l.rarity.as_str().is_empty() {
            rarities.insert(l.rarity.as_str().to_string());
        }
        if l.is_auction {
            auctions += 1;
        }

        price_range = Some(match price_range {
            Some((lo, hi)) => (lo.min(l.price), hi.max(l.price)),
            None => (l.price, l.price),
        });

        if l.has_known_year() {
            year_range = Some(match year_range {
                Some((lo, hi)) => (lo.min(l.year), hi.max(l.year)),
                None => (l.year, l.year),
            });
        }
    }

    ListingFacets {
        total: listings.len(),
        auctions,
        countries: countries.into_iter().collect(),
        conditions: conditions.into_iter().collect(),
        rarities: rarities.into_iter().collect(),
        price_range,
        year_range,
    }
}
