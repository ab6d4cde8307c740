use std::path::PathBuf;
use std::time::Duration;

/// Path prefix of the backend's REST data API.
pub const REST_PREFIX: &str = "rest/v1";

pub const LISTINGS_TABLE: &str = "coins";
pub const BIDS_TABLE: &str = "bids";

/// Rows requested per page when pulling the listing feed.
pub const PAGE_SIZE: usize = 1000;

pub const SNAPSHOT_TTL: Duration = Duration::from_secs(5 * 60);
pub const RESULT_TTL: Duration = Duration::from_secs(60);
/// After a failed refetch, how long the stale snapshot is served before retrying.
pub const FETCH_RETRY_BACKOFF: Duration = Duration::from_secs(60);
pub const RESULT_CACHE_CAPACITY: usize = 256;

/// Views above which a listing counts as trending.
pub const TRENDING_VIEWS: u64 = 50;

pub const ENV_BASE_URL: &str = "COIN_MARKET_URL";
pub const ENV_API_KEY: &str = "COIN_MARKET_KEY";

pub const SNAPSHOT_FILE: &str = "listings.json";
pub const SNAPSHOT_FILE_GZ: &str = "listings.json.gz";
pub const FETCHED_AT_FILE: &str = "fetched_at.txt";

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("coin-market-sdk")
    } else {
        PathBuf::from(".coin-market-sdk-cache")
    }
}

/// Read the backend URL from the environment, ignoring blank values.
pub fn env_base_url() -> Option<String> {
    non_blank_env(ENV_BASE_URL)
}

/// Read the backend API key from the environment, ignoring blank values.
pub fn env_api_key() -> Option<String> {
    non_blank_env(ENV_API_KEY)
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
