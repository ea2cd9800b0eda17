use std::time::Duration;

use flightsearch::{
    airport::{Airport, NewFavorite},
    config::RuntimeConfig,
    core::store::MemoryFlightStore,
    persist::sqlite::SqliteFlightStore,
    runtime::{
        events::FlightEvent,
        handle::{RuntimeError, spawn_flightsearch},
    },
};

fn airport(id: i64, code: &str, name: &str, passengers: i64) -> Airport {
    Airport {
        id,
        iata_code: code.to_string(),
        name: name.to_string(),
        passengers,
    }
}

fn seed() -> Vec<Airport> {
    vec![
        airport(1, "OPO", "Porto Airport", 100),
        airport(2, "AAA", "Anaa Airport", 200),
    ]
}

async fn next<T: Clone + PartialEq + Send + Sync + 'static>(
    live: &mut flightsearch::runtime::live::LiveQuery<T>,
) -> Vec<T> {
    tokio::time::timeout(Duration::from_secs(2), live.changed())
        .await
        .expect("live update")
        .expect("live query open")
}

#[tokio::test]
async fn favorite_mutations_emit_events_in_order() {
    let store = SqliteFlightStore::open_in_memory().expect("open sqlite");
    let handle = spawn_flightsearch(Box::new(store), &RuntimeConfig::default());
    handle.seed_airports(seed()).await.expect("seed");
    let mut sub = handle.subscribe();

    let fav = handle
        .add_favorite(NewFavorite::new("OPO", "AAA"))
        .await
        .expect("add")
        .expect("inserted");
    assert_eq!(
        handle.add_favorite(NewFavorite::new("OPO", "AAA")).await.expect("add again"),
        None
    );
    assert!(handle.remove_favorite(fav.clone()).await.expect("remove"));
    assert!(!handle.remove_favorite(fav.clone()).await.expect("remove again"));

    let mut seen = Vec::new();
    while seen.len() < 2 {
        let evt = tokio::time::timeout(Duration::from_secs(1), sub.recv())
            .await
            .expect("event")
            .expect("recv");
        seen.push(evt);
    }
    assert_eq!(seen[0], FlightEvent::FavoriteAdded { id: fav.id });
    assert_eq!(seen[1], FlightEvent::FavoriteRemoved { id: fav.id });
    assert!(sub.try_recv().is_err(), "ignored writes must not emit");

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn live_favorites_start_with_snapshot_and_follow_changes() {
    let handle = spawn_flightsearch(
        Box::new(MemoryFlightStore::with_airports(seed())),
        &RuntimeConfig::default(),
    );
    handle
        .add_favorite(NewFavorite::new("AAA", "OPO"))
        .await
        .expect("add");

    let mut live = handle.watch_favorites().await.expect("watch");
    let initial = live.current();
    assert_eq!(initial.len(), 1);
    assert_eq!(initial[0].departure_name, "Anaa Airport");

    let added = handle
        .add_favorite(NewFavorite::new("OPO", "AAA"))
        .await
        .expect("add")
        .expect("inserted");
    let after_add = next(&mut live).await;
    assert_eq!(after_add.len(), 2);
    assert_eq!(after_add[1].departure_name, "Porto Airport");
    assert_eq!(after_add[1].destination_name, "Anaa Airport");

    handle.remove_favorite(added).await.expect("remove");
    let after_remove = next(&mut live).await;
    assert_eq!(after_remove, initial);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn live_airport_queries_refresh_after_seeding() {
    let handle = spawn_flightsearch(
        Box::new(SqliteFlightStore::open_in_memory().expect("open sqlite")),
        &RuntimeConfig::default(),
    );

    let mut search = handle.watch_search_airports("A").await.expect("watch search");
    let mut others = handle.watch_other_airports("OPO").await.expect("watch others");
    assert!(search.current().is_empty());
    assert!(others.current().is_empty());

    handle.seed_airports(seed()).await.expect("seed");

    let hits = next(&mut search).await;
    let codes: Vec<_> = hits.iter().map(|a| a.iata_code.as_str()).collect();
    assert_eq!(codes, vec!["AAA", "OPO"]);

    let destinations = next(&mut others).await;
    assert_eq!(destinations.len(), 1);
    assert_eq!(destinations[0].iata_code, "AAA");

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn calls_after_shutdown_report_closed_channel() {
    let handle = spawn_flightsearch(Box::new(MemoryFlightStore::new()), &RuntimeConfig::default());
    handle.shutdown().await.expect("shutdown");

    let res = handle.list_favorites().await;
    assert!(matches!(res, Err(RuntimeError::ChannelClosed)));
}
