//! Airport and favorite route records.

use serde::{Deserialize, Serialize};

use crate::types::{AirportId, FavoriteId};

/// Read-only airport row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Airport {
    /// Stable airport identifier.
    pub id: AirportId,
    /// Three-letter IATA code.
    pub iata_code: String,
    /// Display name.
    pub name: String,
    /// Annual passenger count, used for ordering only.
    pub passengers: i64,
}

/// Saved (departure, destination) route.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Favorite {
    /// Store-assigned identifier.
    pub id: FavoriteId,
    /// IATA code of the departure airport.
    pub departure_code: String,
    /// IATA code of the destination airport.
    pub destination_code: String,
}

/// Insert payload used to create a new [`Favorite`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NewFavorite {
    /// IATA code of the departure airport.
    pub departure_code: String,
    /// IATA code of the destination airport.
    pub destination_code: String,
}

impl NewFavorite {
    /// Builds a route from two codes.
    pub fn new(departure_code: impl Into<String>, destination_code: impl Into<String>) -> Self {
        Self {
            departure_code: departure_code.into(),
            destination_code: destination_code.into(),
        }
    }

    /// Materializes the route with a store-assigned id.
    pub fn with_id(self, id: FavoriteId) -> Favorite {
        Favorite {
            id,
            departure_code: self.departure_code,
            destination_code: self.destination_code,
        }
    }
}

/// A favorite joined with both airport names. Computed at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteView {
    /// Favorite identifier.
    pub id: FavoriteId,
    /// IATA code of the departure airport.
    pub departure_code: String,
    /// IATA code of the destination airport.
    pub destination_code: String,
    /// Resolved departure airport name.
    pub departure_name: String,
    /// Resolved destination airport name.
    pub destination_name: String,
}

impl FavoriteView {
    /// Drops the joined names, leaving the stored record.
    pub fn favorite(&self) -> Favorite {
        Favorite {
            id: self.id,
            departure_code: self.departure_code.clone(),
            destination_code: self.destination_code.clone(),
        }
    }
}
