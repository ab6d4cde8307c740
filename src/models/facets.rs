use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ListingFacets: aggregate view used to build filter controls
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFacets {
    pub total: usize,
    pub auctions: usize,
    pub countries: Vec<String>,
    pub conditions: Vec<String>,
    pub rarities: Vec<String>,
    /// `(min, max)` over all listings, `None` for an empty set.
    pub price_range: Option<(f64, f64)>,
    /// `(min, max)` over listings with a known year.
    pub year_range: Option<(i32, i32)>,
}
