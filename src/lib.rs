//! Airport search and favorite routes over a local SQLite store.
//!
//! # Examples
//!
//! Direct queries against [`persist::sqlite::SqliteFlightStore`]:
//! ```
//! use flightsearch::{
//!     airport::NewFavorite,
//!     persist::{FlightStore, sqlite::SqliteFlightStore},
//!     seed::bundled_airports,
//! };
//!
//! let mut store = SqliteFlightStore::open_in_memory().expect("open sqlite");
//! store.seed_airports(&bundled_airports().expect("seed")).expect("seed");
//!
//! let hits = store.search_airports("london").expect("search");
//! assert_eq!(hits[0].iata_code, "LHR");
//!
//! store.add_favorite(NewFavorite::new("OPO", "LHR")).expect("add");
//! let favorites = store.list_favorites().expect("list");
//! assert_eq!(favorites[0].destination_name, "London Heathrow Airport");
//! ```
//!
//! Runtime usage with live queries and the search controller:
//! ```no_run
//! use flightsearch::{
//!     config::RuntimeConfig,
//!     controller::{SearchController, VisibleList},
//!     persist::sqlite::SqliteFlightStore,
//!     prefs::JsonFilePreferences,
//!     runtime::{handle::spawn_flightsearch, prefs::spawn_preference_writer},
//!     seed::bundled_airports,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let cfg = RuntimeConfig::default();
//! let store = SqliteFlightStore::open("flight_search.db").expect("open sqlite");
//! let flights = spawn_flightsearch(Box::new(store), &cfg);
//! flights.seed_airports(bundled_airports().expect("seed")).await.expect("seed");
//!
//! let prefs = JsonFilePreferences::open("user_preferences.json").expect("open prefs");
//! let prefs = spawn_preference_writer(Box::new(prefs), &cfg);
//!
//! let mut controller = SearchController::start(flights.clone(), prefs.clone()).await;
//! controller.on_query_change("OPO");
//! if let VisibleList::Suggestions(list) = controller.visible_list().await.expect("list") {
//!     let porto = list.current()[0].clone();
//!     controller.on_select_airport(porto);
//! }
//! prefs.shutdown().await.expect("prefs shutdown");
//! flights.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Airport and favorite records.
pub mod airport;
/// Runtime configuration.
pub mod config;
/// Search state machine.
pub mod controller;
/// In-memory store and search predicates.
pub mod core;
/// Store contract and SQLite implementation.
pub mod persist;
/// Preference store contract and implementations.
pub mod prefs;
/// Single-writer runtime handle, live queries and events.
pub mod runtime;
/// Bundled airport dataset.
pub mod seed;
/// Shared primitive types.
pub mod types;
