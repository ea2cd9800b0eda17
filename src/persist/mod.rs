/// SQLite-backed store.
pub mod sqlite;

use std::fmt;

use crate::airport::{Airport, Favorite, FavoriteView, NewFavorite};

/// Storage failure surfaced to the caller of one operation.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite error.
    Sqlite(rusqlite::Error),
    /// Any other storage failure.
    Message(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::Message(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Message(_) => None,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Airport and favorite queries.
///
/// Airport lists are ordered busiest first with ties broken by id. Favorite
/// codes are not checked against the airport table; a favorite whose codes do
/// not resolve is kept but left out of [`FlightStore::list_favorites`].
pub trait FlightStore: Send {
    /// Airports whose name or code contains `substring` (ASCII
    /// case-insensitive, wildcards matched literally).
    fn search_airports(&self, substring: &str) -> StoreResult<Vec<Airport>>;

    /// Airports whose code is not exactly `exclude_code`.
    fn list_other_airports(&self, exclude_code: &str) -> StoreResult<Vec<Airport>>;

    /// Favorites joined with both airport names, in insertion order.
    fn list_favorites(&self) -> StoreResult<Vec<FavoriteView>>;

    /// Inserts the route unless the same pair is already saved.
    /// Returns `None` when the insert was ignored.
    fn add_favorite(&mut self, favorite: NewFavorite) -> StoreResult<Option<Favorite>>;

    /// Deletes by id. Returns `false` when nothing matched.
    fn remove_favorite(&mut self, favorite: &Favorite) -> StoreResult<bool>;

    /// Looks up a saved route by its code pair.
    fn find_favorite(&self, departure_code: &str, destination_code: &str)
    -> StoreResult<Option<Favorite>>;

    /// First-run population. Does nothing once any airport exists.
    fn seed_airports(&mut self, airports: &[Airport]) -> StoreResult<usize>;

    /// Number of airport rows.
    fn airport_count(&self) -> StoreResult<usize>;
}
