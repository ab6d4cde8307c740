//! Query modules for the marketplace SDK.
//!
//! Each module provides a query struct that borrows from a [`MarketSdk`](crate::MarketSdk)
//! and exposes methods returning `Result<T>` with typed payloads.

pub mod bids;
pub mod listings;

pub use bids::BidQuery;
pub use listings::ListingQuery;
