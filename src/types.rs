//! Shared primitive IDs and well-known keys.

/// Store-assigned airport identifier.
pub type AirportId = i64;
/// Store-assigned favorite route identifier.
pub type FavoriteId = i64;

/// Preference key holding the last search text.
pub const SEARCH_QUERY_KEY: &str = "search_query";
