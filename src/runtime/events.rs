//! Runtime event stream payloads.

use crate::types::FavoriteId;

/// Events emitted from the single-writer runtime loop after a mutation
/// actually changed stored data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlightEvent {
    /// A new favorite route was saved.
    FavoriteAdded {
        /// Inserted favorite id.
        id: FavoriteId,
    },
    /// A favorite route was deleted.
    FavoriteRemoved {
        /// Deleted favorite id.
        id: FavoriteId,
    },
    /// The airport table was populated.
    AirportsSeeded {
        /// Rows inserted.
        count: usize,
    },
}

impl FlightEvent {
    /// True when airport lists may have changed.
    pub fn touches_airports(&self) -> bool {
        matches!(self, Self::AirportsSeeded { .. })
    }

    /// True when the joined favorite list may have changed.
    pub fn touches_favorites(&self) -> bool {
        matches!(
            self,
            Self::FavoriteAdded { .. } | Self::FavoriteRemoved { .. } | Self::AirportsSeeded { .. }
        )
    }
}
