//! Search bar and selection state, and which list it puts on screen.

use crate::{
    airport::{Airport, Favorite, FavoriteView, NewFavorite},
    runtime::{
        handle::{FlightSearchHandle, RuntimeError},
        live::LiveQuery,
        prefs::PreferenceHandle,
    },
    types::SEARCH_QUERY_KEY,
};

/// In-memory search state. Only `search_query` is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    /// Current search text.
    pub search_query: String,
    /// Departure airport picked from the suggestions.
    pub selected_airport: Option<Airport>,
    /// Whether the suggestion list is showing.
    pub is_active: bool,
}

/// Coarse state derived from [`SearchState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    /// Blank query, nothing selected.
    Idle,
    /// Non-blank query, nothing selected.
    Searching,
    /// A departure airport is selected.
    AirportSelected,
}

impl SearchState {
    /// Phase implied by the current fields.
    pub fn phase(&self) -> SearchPhase {
        if self.selected_airport.is_some() {
            SearchPhase::AirportSelected
        } else if is_blank(&self.search_query) {
            SearchPhase::Idle
        } else {
            SearchPhase::Searching
        }
    }
}

/// The list the presentation layer should show.
pub enum VisibleList {
    /// Airports matching the query.
    Suggestions(LiveQuery<Airport>),
    /// Destination candidates for the selected departure.
    Destinations {
        /// Selected departure airport.
        departure: Airport,
        /// Every other airport.
        airports: LiveQuery<Airport>,
    },
    /// Saved routes.
    Favorites(LiveQuery<FavoriteView>),
}

/// Single owner of [`SearchState`].
pub struct SearchController {
    flights: FlightSearchHandle,
    prefs: PreferenceHandle,
    state: SearchState,
}

impl SearchController {
    /// Builds a controller with `search_query` seeded from the stored value.
    /// A failed read starts with an empty query.
    pub async fn start(flights: FlightSearchHandle, prefs: PreferenceHandle) -> Self {
        let search_query = match prefs.get(SEARCH_QUERY_KEY).await {
            Ok(stored) => stored.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %err, "could not read stored search query");
                String::new()
            }
        };
        tracing::debug!(%search_query, "search controller started");

        Self {
            flights,
            prefs,
            state: SearchState {
                search_query,
                ..SearchState::default()
            },
        }
    }

    /// Current state.
    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Current phase.
    pub fn phase(&self) -> SearchPhase {
        self.state.phase()
    }

    /// Replaces the query text and queues it for persistence.
    ///
    /// A blank query clears the selection and closes the suggestions. Any
    /// other text keeps both as they are.
    pub fn on_query_change(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.prefs.set(SEARCH_QUERY_KEY, text.clone());
        if is_blank(&text) {
            self.state.selected_airport = None;
            self.state.is_active = false;
        }
        self.state.search_query = text;
    }

    /// Opens or closes the suggestion list. Opening it is ignored while an
    /// airport is selected.
    pub fn on_search_bar_active_change(&mut self, active: bool) {
        if active && self.state.selected_airport.is_some() {
            tracing::debug!("search bar activation ignored while a departure is selected");
            return;
        }
        self.state.is_active = active;
    }

    /// Picks a departure airport and closes the suggestions. Ignored while
    /// the query is blank, since no suggestion list is showing then.
    pub fn on_select_airport(&mut self, airport: Airport) {
        if is_blank(&self.state.search_query) {
            tracing::debug!(code = %airport.iata_code, "selection ignored with a blank query");
            return;
        }
        tracing::debug!(code = %airport.iata_code, "departure selected");
        self.state.selected_airport = Some(airport);
        self.state.is_active = false;
    }

    /// Clear button.
    pub fn clear_query(&mut self) {
        self.on_query_change(String::new());
        self.state.is_active = false;
    }

    /// Subscribes to whichever list the current state calls for.
    pub async fn visible_list(&self) -> Result<VisibleList, RuntimeError> {
        if let Some(departure) = &self.state.selected_airport {
            let airports = self
                .flights
                .watch_other_airports(departure.iata_code.clone())
                .await?;
            return Ok(VisibleList::Destinations {
                departure: departure.clone(),
                airports,
            });
        }
        if !is_blank(&self.state.search_query) {
            let airports = self
                .flights
                .watch_search_airports(self.state.search_query.clone())
                .await?;
            return Ok(VisibleList::Suggestions(airports));
        }
        Ok(VisibleList::Favorites(self.flights.watch_favorites().await?))
    }

    /// Saves the route from the selected airport to `destination`.
    pub async fn add_favorite(&self, destination: &Airport) -> Result<Option<Favorite>, RuntimeError> {
        let departure = self
            .state
            .selected_airport
            .as_ref()
            .ok_or(RuntimeError::NoDeparture)?;
        self.add_favorite_codes(&departure.iata_code, &destination.iata_code)
            .await
    }

    /// Saves a route by codes. Codes are not checked against the airports.
    pub async fn add_favorite_codes(
        &self,
        departure_code: &str,
        destination_code: &str,
    ) -> Result<Option<Favorite>, RuntimeError> {
        self.flights
            .add_favorite(NewFavorite::new(departure_code, destination_code))
            .await
    }

    /// Deletes a saved route by id.
    pub async fn remove_favorite(&self, favorite: Favorite) -> Result<bool, RuntimeError> {
        self.flights.remove_favorite(favorite).await
    }

    /// Adds the route from the selected airport to `destination`, or removes
    /// it when already saved. Returns whether the route is saved afterwards.
    pub async fn toggle_favorite(&self, destination: &Airport) -> Result<bool, RuntimeError> {
        let departure = self
            .state
            .selected_airport
            .as_ref()
            .ok_or(RuntimeError::NoDeparture)?;
        let existing = self
            .flights
            .find_favorite(departure.iata_code.clone(), destination.iata_code.clone())
            .await?;
        match existing {
            Some(favorite) => {
                self.flights.remove_favorite(favorite).await?;
                Ok(false)
            }
            None => {
                self.add_favorite(destination).await?;
                Ok(true)
            }
        }
    }
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
