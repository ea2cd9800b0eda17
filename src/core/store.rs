use hashbrown::{HashMap, HashSet};

use crate::{
    airport::{Airport, Favorite, FavoriteView, NewFavorite},
    persist::{FlightStore, StoreError, StoreResult},
    types::FavoriteId,
};

use super::matching::{airport_matches, busiest_first};

/// Authoritative in-memory store with the same query semantics as
/// [`crate::persist::sqlite::SqliteFlightStore`].
#[derive(Debug)]
pub struct MemoryFlightStore {
    airports: Vec<Airport>,
    by_code: HashMap<String, usize>,
    favorites: HashMap<FavoriteId, Favorite>,
    order: Vec<FavoriteId>,
    by_route: HashMap<(String, String), FavoriteId>,
    next_favorite_id: FavoriteId,
}

impl Default for MemoryFlightStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFlightStore {
    /// Empty store.
    pub fn new() -> Self {
        Self {
            airports: Vec::new(),
            by_code: HashMap::new(),
            favorites: HashMap::new(),
            order: Vec::new(),
            by_route: HashMap::new(),
            next_favorite_id: 1,
        }
    }

    /// Store pre-seeded with `airports`.
    pub fn with_airports(airports: Vec<Airport>) -> Self {
        let mut store = Self::new();
        for airport in airports {
            store.push_airport(airport);
        }
        store
    }

    /// Favorites in insertion order, joined or not.
    pub fn favorites(&self) -> Vec<Favorite> {
        self.order
            .iter()
            .filter_map(|id| self.favorites.get(id).cloned())
            .collect()
    }

    fn push_airport(&mut self, airport: Airport) {
        self.by_code
            .insert(airport.iata_code.clone(), self.airports.len());
        self.airports.push(airport);
    }

    fn airport_by_code(&self, code: &str) -> Option<&Airport> {
        self.by_code.get(code).and_then(|idx| self.airports.get(*idx))
    }

    fn sorted(&self, keep: impl Fn(&Airport) -> bool) -> Vec<Airport> {
        let mut out: Vec<Airport> = self.airports.iter().filter(|a| keep(*a)).cloned().collect();
        out.sort_by(busiest_first);
        out
    }
}

impl FlightStore for MemoryFlightStore {
    fn search_airports(&self, substring: &str) -> StoreResult<Vec<Airport>> {
        Ok(self.sorted(|a| airport_matches(a, substring)))
    }

    fn list_other_airports(&self, exclude_code: &str) -> StoreResult<Vec<Airport>> {
        Ok(self.sorted(|a| a.iata_code != exclude_code))
    }

    fn list_favorites(&self) -> StoreResult<Vec<FavoriteView>> {
        let views = self
            .order
            .iter()
            .filter_map(|id| self.favorites.get(id))
            .filter_map(|fav| {
                let dep = self.airport_by_code(&fav.departure_code)?;
                let dest = self.airport_by_code(&fav.destination_code)?;
                Some(FavoriteView {
                    id: fav.id,
                    departure_code: fav.departure_code.clone(),
                    destination_code: fav.destination_code.clone(),
                    departure_name: dep.name.clone(),
                    destination_name: dest.name.clone(),
                })
            })
            .collect();
        Ok(views)
    }

    fn add_favorite(&mut self, favorite: NewFavorite) -> StoreResult<Option<Favorite>> {
        let key = (
            favorite.departure_code.clone(),
            favorite.destination_code.clone(),
        );
        if self.by_route.contains_key(&key) {
            return Ok(None);
        }

        let id = self.next_favorite_id;
        self.next_favorite_id += 1;
        let stored = favorite.with_id(id);
        self.by_route.insert(key, id);
        self.order.push(id);
        self.favorites.insert(id, stored.clone());
        Ok(Some(stored))
    }

    fn remove_favorite(&mut self, favorite: &Favorite) -> StoreResult<bool> {
        let Some(stored) = self.favorites.remove(&favorite.id) else {
            return Ok(false);
        };
        self.by_route
            .remove(&(stored.departure_code, stored.destination_code));
        if let Some(pos) = self.order.iter().position(|x| *x == favorite.id) {
            self.order.remove(pos);
        }
        Ok(true)
    }

    fn find_favorite(
        &self,
        departure_code: &str,
        destination_code: &str,
    ) -> StoreResult<Option<Favorite>> {
        let key = (departure_code.to_string(), destination_code.to_string());
        Ok(self
            .by_route
            .get(&key)
            .and_then(|id| self.favorites.get(id))
            .cloned())
    }

    fn seed_airports(&mut self, airports: &[Airport]) -> StoreResult<usize> {
        if !self.airports.is_empty() {
            return Ok(0);
        }
        let mut ids = HashSet::new();
        let mut codes = HashSet::new();
        for airport in airports {
            if !ids.insert(airport.id) || !codes.insert(airport.iata_code.as_str()) {
                return Err(StoreError::Message(format!(
                    "duplicate airport {} ({})",
                    airport.id, airport.iata_code
                )));
            }
        }
        for airport in airports {
            self.push_airport(airport.clone());
        }
        Ok(airports.len())
    }

    fn airport_count(&self) -> StoreResult<usize> {
        Ok(self.airports.len())
    }
}
