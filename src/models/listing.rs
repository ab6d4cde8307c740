use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Rarity
// ---------------------------------------------------------------------------

/// Rarity grade assigned by the seller.
///
/// Parsing is lenient (`"ultra rare"`, `"Ultra_Rare"` and `"ultra-rare"` all
/// map to [`Rarity::UltraRare`]); text that matches none of the known grades
/// is preserved as [`Rarity::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rarity {
    #[default]
    Unspecified,
    Common,
    Uncommon,
    Rare,
    UltraRare,
    Other(String),
}

impl Rarity {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let folded: String = trimmed
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "" => Rarity::Unspecified,
            "common" => Rarity::Common,
            "uncommon" => Rarity::Uncommon,
            "rare" => Rarity::Rare,
            "ultrarare" => Rarity::UltraRare,
            _ => Rarity::Other(trimmed.to_string()),
        }
    }

    /// Display label as shown to users and compared by the rarity filter.
    pub fn as_str(&self) -> &str {
        match self {
            Rarity::Unspecified => "",
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::UltraRare => "Ultra Rare",
            Rarity::Other(s) => s,
        }
    }

    pub fn is_rare(&self) -> bool {
        matches!(self, Rarity::Rare | Rarity::UltraRare)
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Rarity {
    fn from(s: String) -> Self {
        Rarity::parse(&s)
    }
}

impl From<Rarity> for String {
    fn from(r: Rarity) -> Self {
        r.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// ListingKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    #[default]
    Coin,
    Banknote,
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// One coin or banknote offered for sale or auction.
///
/// Produced by the loader with every field defaulted, so downstream stages
/// never need to ask whether a value was present in the backend record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub name: String,
    pub description: String,
    pub country: String,
    /// Minting year; negative for BC, `0` when unknown.
    pub year: i32,
    pub denomination: String,
    pub composition: String,
    pub condition: String,
    pub grade: String,
    pub rarity: Rarity,
    pub category: String,
    pub kind: ListingKind,
    pub pcgs_number: String,
    pub ngc_number: String,

    pub price: f64,
    pub is_auction: bool,
    pub auction_end: Option<DateTime<Utc>>,
    pub current_bid: Option<f64>,
    pub reserve_price: Option<f64>,

    pub image_url: String,

    pub views: u64,
    pub featured: bool,
    pub favorites: u64,

    pub seller_id: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Listing {
    /// Create a listing with the given id and every other field at its default.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            description: String::new(),
            country: String::new(),
            year: 0,
            denomination: String::new(),
            composition: String::new(),
            condition: String::new(),
            grade: String::new(),
            rarity: Rarity::Unspecified,
            category: String::new(),
            kind: ListingKind::Coin,
            pcgs_number: String::new(),
            ngc_number: String::new(),
            price: 0.0,
            is_auction: false,
            auction_end: None,
            current_bid: None,
            reserve_price: None,
            image_url: String::new(),
            views: 0,
            featured: false,
            favorites: 0,
            seller_id: String::new(),
            created_at: None,
        }
    }

    pub fn has_image(&self) -> bool {
        !self.image_url.trim().is_empty()
    }

    pub fn has_grade(&self) -> bool {
        !self.grade.trim().is_empty()
    }

    /// True when a third-party grading service certified the piece.
    pub fn is_certified(&self) -> bool {
        !self.pcgs_number.trim().is_empty() || !self.ngc_number.trim().is_empty()
    }

    pub fn has_known_year(&self) -> bool {
        self.year != 0
    }

    /// Check whether an auction listing is still open at `now`.
    ///
    /// Listings without an end time are treated as open.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_auction && self.auction_end.map_or(true, |end| end > now)
    }
}
