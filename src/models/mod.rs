pub mod bid;
pub mod facets;
pub mod listing;

pub use bid::*;
pub use facets::*;
pub use listing::*;
