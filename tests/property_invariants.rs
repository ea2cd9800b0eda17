use std::sync::OnceLock;

use proptest::prelude::*;
use tokio::runtime::Runtime;

use flightsearch::{
    airport::{Airport, FavoriteView, NewFavorite},
    config::RuntimeConfig,
    controller::{SearchController, SearchPhase},
    core::{
        matching::{airport_matches, contains_folded},
        store::MemoryFlightStore,
    },
    persist::{FlightStore, sqlite::SqliteFlightStore},
    prefs::MemoryPreferences,
    runtime::{handle::spawn_flightsearch, prefs::spawn_preference_writer},
};

#[derive(Debug, Clone)]
enum Action {
    Add { dep: u8, dest: u8 },
    Remove { target: u8 },
}

#[derive(Debug, Clone)]
enum UiAction {
    Query(String),
    Active(bool),
    Select(u8),
    Clear,
}

fn ui_action_strategy() -> impl Strategy<Value = UiAction> {
    prop_oneof![
        "[A-Z ]{0,3}".prop_map(UiAction::Query),
        any::<bool>().prop_map(UiAction::Active),
        (0u8..4).prop_map(UiAction::Select),
        Just(UiAction::Clear),
    ]
}

fn runtime() -> &'static Runtime {
    static RT: OnceLock<Runtime> = OnceLock::new();
    RT.get_or_init(|| Runtime::new().expect("tokio runtime"))
}

fn code_for(idx: usize) -> String {
    let letters = [
        b'A' + (idx / 676 % 26) as u8,
        b'A' + (idx / 26 % 26) as u8,
        b'A' + (idx % 26) as u8,
    ];
    String::from_utf8(letters.to_vec()).expect("ascii")
}

fn airports_strategy() -> impl Strategy<Value = Vec<Airport>> {
    prop::collection::vec(("[A-Za-z %_]{1,12}", 0i64..500), 0..24).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(idx, (name, passengers))| Airport {
                id: idx as i64 + 1,
                iata_code: code_for(idx * 7),
                name,
                passengers,
            })
            .collect()
    })
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0u8..6, 0u8..6).prop_map(|(dep, dest)| Action::Add { dep, dest }),
        (0u8..12).prop_map(|target| Action::Remove { target }),
    ]
}

fn stores(airports: &[Airport]) -> (SqliteFlightStore, MemoryFlightStore) {
    let mut sqlite = SqliteFlightStore::open_in_memory().expect("open sqlite");
    sqlite.seed_airports(airports).expect("seed sqlite");
    let mut memory = MemoryFlightStore::new();
    memory.seed_airports(airports).expect("seed memory");
    (sqlite, memory)
}

fn without_ids(views: Vec<FavoriteView>) -> Vec<(String, String, String, String)> {
    views
        .into_iter()
        .map(|v| (v.departure_code, v.destination_code, v.departure_name, v.destination_name))
        .collect()
}

fn is_busiest_first(airports: &[Airport]) -> bool {
    airports.windows(2).all(|w| w[0].passengers >= w[1].passengers)
}

proptest! {
    #[test]
    fn search_hits_match_and_are_sorted(airports in airports_strategy(), needle in "[A-Za-z%_ ]{0,2}") {
        let (sqlite, memory) = stores(&airports);

        let hits = sqlite.search_airports(&needle).expect("search");
        prop_assert!(hits.iter().all(|a| airport_matches(a, &needle)));
        prop_assert!(is_busiest_first(&hits));

        let expected = airports
            .iter()
            .filter(|a| contains_folded(&a.name, &needle) || contains_folded(&a.iata_code, &needle))
            .count();
        prop_assert_eq!(hits.len(), expected);
        prop_assert_eq!(hits, memory.search_airports(&needle).expect("memory search"));
    }

    #[test]
    fn other_airports_never_contain_the_excluded_code(airports in airports_strategy(), pick in 0usize..30) {
        let (sqlite, memory) = stores(&airports);
        let code = airports.get(pick).map(|a| a.iata_code.clone()).unwrap_or_default();

        let others = sqlite.list_other_airports(&code).expect("others");
        prop_assert!(others.iter().all(|a| a.iata_code != code));
        prop_assert!(is_busiest_first(&others));
        let expected = if airports.iter().any(|a| a.iata_code == code) {
            airports.len() - 1
        } else {
            airports.len()
        };
        prop_assert_eq!(others.len(), expected);
        prop_assert_eq!(others, memory.list_other_airports(&code).expect("memory others"));
    }

    #[test]
    fn favorite_sequences_agree_with_memory_model(actions in prop::collection::vec(action_strategy(), 1..60)) {
        let airports: Vec<Airport> = (0..4)
            .map(|idx| Airport {
                id: idx as i64 + 1,
                iata_code: code_for(idx),
                name: format!("Airport {idx}"),
                passengers: 10 * idx as i64,
            })
            .collect();
        let (mut sqlite, mut memory) = stores(&airports);

        for action in actions {
            match action {
                Action::Add { dep, dest } => {
                    // Codes 4 and 5 do not resolve to an airport.
                    let fav = NewFavorite::new(code_for(usize::from(dep)), code_for(usize::from(dest)));
                    let a = sqlite.add_favorite(fav.clone()).expect("sqlite add");
                    let b = memory.add_favorite(fav).expect("memory add");
                    prop_assert_eq!(a.is_some(), b.is_some());
                }
                Action::Remove { target } => {
                    let a_all = sqlite.favorites().expect("sqlite favorites");
                    let b_all = memory.favorites();
                    prop_assert_eq!(a_all.len(), b_all.len());
                    if a_all.is_empty() {
                        continue;
                    }
                    let idx = usize::from(target) % a_all.len();
                    prop_assert!(sqlite.remove_favorite(&a_all[idx]).expect("sqlite remove"));
                    prop_assert!(memory.remove_favorite(&b_all[idx]).expect("memory remove"));
                    prop_assert!(!sqlite.remove_favorite(&a_all[idx]).expect("sqlite remove again"));
                }
            }

            let listed = sqlite.list_favorites().expect("sqlite list");
            let mut pairs: Vec<_> = listed
                .iter()
                .map(|v| (v.departure_code.clone(), v.destination_code.clone()))
                .collect();
            let total = pairs.len();
            pairs.sort();
            pairs.dedup();
            prop_assert_eq!(pairs.len(), total);
            prop_assert_eq!(
                without_ids(listed),
                without_ids(memory.list_favorites().expect("memory list"))
            );
        }
    }

    #[test]
    fn ui_sequences_ending_in_blank_query_return_to_idle(
        actions in prop::collection::vec(ui_action_strategy(), 0..40),
        blank in "[ ]{0,3}",
    ) {
        let airports: Vec<Airport> = (0..4)
            .map(|idx| Airport {
                id: idx as i64 + 1,
                iata_code: code_for(idx),
                name: format!("Airport {idx}"),
                passengers: 10 * idx as i64,
            })
            .collect();

        let mut controller = runtime().block_on(async {
            let cfg = RuntimeConfig::default();
            let flights = spawn_flightsearch(
                Box::new(MemoryFlightStore::with_airports(airports.clone())),
                &cfg,
            );
            let prefs = spawn_preference_writer(Box::new(MemoryPreferences::new()), &cfg);
            SearchController::start(flights, prefs).await
        });

        for action in actions {
            match action {
                UiAction::Query(text) => controller.on_query_change(text),
                UiAction::Active(active) => controller.on_search_bar_active_change(active),
                UiAction::Select(idx) => {
                    controller.on_select_airport(airports[usize::from(idx)].clone())
                }
                UiAction::Clear => controller.clear_query(),
            }

            let state = controller.state();
            if state.selected_airport.is_some() {
                prop_assert!(!state.is_active);
                prop_assert!(!state.search_query.trim().is_empty());
            }
        }

        controller.on_query_change(blank);
        prop_assert_eq!(controller.state().selected_airport.clone(), None);
        prop_assert!(!controller.state().is_active);
        prop_assert_eq!(controller.phase(), SearchPhase::Idle);
    }
}
