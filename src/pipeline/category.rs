//! Category classifier: a single lookup table of named listing predicates.
//!
//! Category-based filtering goes through this table and nowhere else. New
//! categories are added with [`CategoryClassifier::register`], not by
//! branching in the filter stage.

use std::fmt;
use std::sync::Arc;

use crate::config;
use crate::models::{Listing, ListingKind};

/// A total, side-effect-free test over a listing.
pub type Predicate = Arc<dyn Fn(&Listing) -> bool + Send + Sync>;

/// Tag that means "no category constraint".
pub const ALL: &str = "all";

const EUROPEAN_COUNTRIES: &[&str] = &[
    "albania", "andorra", "austria", "belarus", "belgium", "bosnia and herzegovina",
    "bulgaria", "croatia", "cyprus", "czech republic", "czechia", "czechoslovakia",
    "denmark", "england", "estonia", "finland", "france", "germany", "great britain",
    "greece", "hungary", "iceland", "ireland", "italy", "latvia", "liechtenstein",
    "lithuania", "luxembourg", "malta", "moldova", "monaco", "montenegro", "netherlands",
    "north macedonia", "norway", "poland", "portugal", "romania", "russia", "san marino",
    "scotland", "serbia", "slovakia", "slovenia", "soviet union", "spain", "sweden",
    "switzerland", "ukraine", "united kingdom", "uk", "ussr", "vatican", "vatican city",
    "wales", "yugoslavia",
];

const ASIAN_COUNTRIES: &[&str] = &[
    "afghanistan", "bangladesh", "cambodia", "china", "hong kong", "india", "indonesia",
    "iran", "iraq", "israel", "japan", "jordan", "kazakhstan", "korea", "laos", "macau",
    "malaysia", "mongolia", "myanmar", "nepal", "north korea", "pakistan", "philippines",
    "saudi arabia", "singapore", "south korea", "sri lanka", "syria", "taiwan", "thailand",
    "turkey", "united arab emirates", "uzbekistan", "vietnam",
];

const AMERICAS_COUNTRIES: &[&str] = &[
    "argentina", "bahamas", "bolivia", "brazil", "canada", "chile", "colombia",
    "costa rica", "cuba", "dominican republic", "ecuador", "el salvador", "guatemala",
    "haiti", "honduras", "jamaica", "mexico", "nicaragua", "panama", "paraguay", "peru",
    "united states", "united states of america", "usa", "us", "uruguay", "venezuela",
];

const ERROR_PATTERNS: &[&str] = &[
    "error", "doubled die", "double die", "off-center", "off center", "mule",
    "broadstrike", "misstrike", "mis-strike", "die crack", "clipped planchet",
];

const GOLD_NAMES: &[&str] = &["gold", "oro", "ouro", "or", "goud", "guld", "złoto", "zloto"];
const SILVER_NAMES: &[&str] = &[
    "silver", "plata", "prata", "argent", "silber", "zilver", "sølv", "srebro",
];

// ---------------------------------------------------------------------------
// CategoryClassifier
// ---------------------------------------------------------------------------

/// Lookup table mapping category tags to listing predicates.
///
/// Tags are matched case-insensitively. [`Default`] yields the standard table.
#[derive(Clone)]
pub struct CategoryClassifier {
    entries: Vec<(String, Predicate)>,
}

impl CategoryClassifier {
    /// A classifier with no categories registered.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The standard marketplace category table.
    pub fn standard() -> Self {
        Self::with_trending_threshold(config::TRENDING_VIEWS)
    }

    /// The standard table with a custom view threshold for `"trending"`.
    pub fn with_trending_threshold(threshold: u64) -> Self {
        let mut c = Self::empty();
        c.register("ancient", |l| l.has_known_year() && l.year < 1000);
        c.register("medieval", |l| (1000..1500).contains(&l.year));
        c.register("modern", |l| l.year >= 1900);
        c.register("european", |l| country_in(l, EUROPEAN_COUNTRIES));
        c.register("asian", |l| country_in(l, ASIAN_COUNTRIES));
        c.register("americas", |l| country_in(l, AMERICAS_COUNTRIES));
        c.register("error", is_error_coin);
        c.register("graded", Listing::is_certified);
        c.register("gold", |l| composition_has(l, GOLD_NAMES));
        c.register("silver", |l| composition_has(l, SILVER_NAMES));
        c.register("rare", |l| l.rarity.is_rare());
        c.register("trending", move |l| l.views > threshold);
        c.register("featured", |l| l.featured);
        c.register("auction", |l| l.is_auction);
        c.register("banknote", |l| l.kind == ListingKind::Banknote);
        c.register("commemorative", |l| {
            contains_ci(&l.name, "commemorative") || contains_ci(&l.description, "commemorative")
        });
        c
    }

    /// Add a category, replacing any existing predicate registered under the same tag.
    pub fn register<F>(&mut self, tag: &str, predicate: F) -> &mut Self
    where
        F: Fn(&Listing) -> bool + Send + Sync + 'static,
    {
        let tag = tag.trim().to_lowercase();
        let predicate: Predicate = Arc::new(predicate);
        match self.entries.iter_mut().find(|(t, _)| *t == tag) {
            Some(entry) => entry.1 = predicate,
            None => self.entries.push((tag, predicate)),
        }
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.lookup(tag).is_some()
    }

    /// Evaluate a category for a listing.
    ///
    /// Returns `None` if the tag is not registered.
    pub fn matches(&self, tag: &str, listing: &Listing) -> Option<bool> {
        self.lookup(tag).map(|p| p(listing))
    }

    /// Shared handle to the predicate registered under `tag`.
    pub fn predicate(&self, tag: &str) -> Option<Predicate> {
        self.lookup(tag).cloned()
    }

    /// All tags whose predicate accepts the listing, in registration order.
    pub fn classify(&self, listing: &Listing) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, p)| p(listing))
            .map(|(t, _)| t.as_str())
            .collect()
    }

    /// Registered tags in registration order.
    pub fn tags(&self) -> Vec<&str> {
        self.entries.iter().map(|(t, _)| t.as_str()).collect()
    }

    fn lookup(&self, tag: &str) -> Option<&Predicate> {
        let tag = tag.trim().to_lowercase();
        self.entries.iter().find(|(t, _)| *t == tag).map(|(_, p)| p)
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for CategoryClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CategoryClassifier")
            .field("tags", &self.tags())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Predicate helpers
// ---------------------------------------------------------------------------

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn country_in(listing: &Listing, countries: &[&str]) -> bool {
    let country = listing.country.trim().to_lowercase();
    !country.is_empty() && countries.contains(&country.as_str())
}

/// Names shorter than three characters ("or") only match as whole words.
fn composition_has(listing: &Listing, names: &[&str]) -> bool {
    let composition = listing.composition.to_lowercase();
    names.iter().any(|n| {
        if n.chars().count() < 3 {
            composition
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == *n)
        } else {
            composition.contains(*n)
        }
    })
}

fn is_error_coin(listing: &Listing) -> bool {
    if contains_ci(&listing.category, "error") {
        return true;
    }
    let text = format!("{} {}", listing.name, listing.description).to_lowercase();
    ERROR_PATTERNS.iter().any(|p| text.contains(*p))
}
