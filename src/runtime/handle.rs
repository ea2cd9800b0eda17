use std::{fmt, sync::Arc};

use tokio::sync::{Mutex, broadcast, mpsc, oneshot};

use crate::{
    airport::{Airport, Favorite, FavoriteView, NewFavorite},
    config::RuntimeConfig,
    persist::{FlightStore, StoreError, StoreResult},
    prefs::PrefsError,
};

use super::{
    events::FlightEvent,
    live::{FavoritesSource, LiveQuery, LiveSource, OtherAirportsSource, SearchSource},
};

/// Failure of one runtime operation.
#[derive(Debug)]
pub enum RuntimeError {
    /// The store rejected or failed the operation.
    Store(StoreError),
    /// The preference store failed.
    Prefs(PrefsError),
    /// A favorite was requested without a selected departure airport.
    NoDeparture,
    /// A blocking worker panicked or was cancelled.
    Join(String),
    /// The runtime has shut down.
    ChannelClosed,
}

impl From<StoreError> for RuntimeError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<PrefsError> for RuntimeError {
    fn from(value: PrefsError) -> Self {
        Self::Prefs(value)
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(err) => write!(f, "store: {err}"),
            Self::Prefs(err) => write!(f, "preferences: {err}"),
            Self::NoDeparture => f.write_str("no departure airport selected"),
            Self::Join(msg) => write!(f, "worker join error: {msg}"),
            Self::ChannelClosed => f.write_str("runtime channel closed"),
        }
    }
}

impl std::error::Error for RuntimeError {}

type SharedStore = Arc<Mutex<Box<dyn FlightStore>>>;
type Reply<T> = oneshot::Sender<Result<T, RuntimeError>>;

/// Clonable handle to the store loop.
#[derive(Clone)]
pub struct FlightSearchHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<FlightEvent>,
}

enum Command {
    SearchAirports {
        substring: String,
        resp: Reply<Vec<Airport>>,
    },
    ListOtherAirports {
        exclude_code: String,
        resp: Reply<Vec<Airport>>,
    },
    ListFavorites {
        resp: Reply<Vec<FavoriteView>>,
    },
    FindFavorite {
        departure_code: String,
        destination_code: String,
        resp: Reply<Option<Favorite>>,
    },
    AddFavorite {
        favorite: NewFavorite,
        resp: Reply<Option<Favorite>>,
    },
    RemoveFavorite {
        favorite: Favorite,
        resp: Reply<bool>,
    },
    SeedAirports {
        airports: Vec<Airport>,
        resp: Reply<usize>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Starts the store loop on the current tokio runtime.
///
/// Every command runs to completion before the next one starts, and change
/// events are broadcast only after the mutation has been applied.
pub fn spawn_flightsearch(store: Box<dyn FlightStore>, config: &RuntimeConfig) -> FlightSearchHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<FlightEvent>(config.event_capacity.max(1));

    let events_tx_loop = events_tx.clone();
    let store: SharedStore = Arc::new(Mutex::new(store));

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &store, &events_tx_loop).await {
                break;
            }
        }
        tracing::debug!("flight store loop stopped");
    });

    FlightSearchHandle { cmd_tx, events_tx }
}

impl FlightSearchHandle {
    /// Raw change-event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<FlightEvent> {
        self.events_tx.subscribe()
    }

    /// One-shot airport search.
    pub async fn search_airports(&self, substring: impl Into<String>) -> Result<Vec<Airport>, RuntimeError> {
        let substring = substring.into();
        self.request(|resp| Command::SearchAirports { substring, resp }).await
    }

    /// One-shot list of every airport except `exclude_code`.
    pub async fn list_other_airports(
        &self,
        exclude_code: impl Into<String>,
    ) -> Result<Vec<Airport>, RuntimeError> {
        let exclude_code = exclude_code.into();
        self.request(|resp| Command::ListOtherAirports { exclude_code, resp })
            .await
    }

    /// One-shot joined favorite list.
    pub async fn list_favorites(&self) -> Result<Vec<FavoriteView>, RuntimeError> {
        self.request(|resp| Command::ListFavorites { resp }).await
    }

    /// Saved route for the code pair, if any.
    pub async fn find_favorite(
        &self,
        departure_code: impl Into<String>,
        destination_code: impl Into<String>,
    ) -> Result<Option<Favorite>, RuntimeError> {
        let departure_code = departure_code.into();
        let destination_code = destination_code.into();
        self.request(|resp| Command::FindFavorite {
            departure_code,
            destination_code,
            resp,
        })
        .await
    }

    /// Saves a route. Returns `None` when the pair was already saved.
    pub async fn add_favorite(&self, favorite: NewFavorite) -> Result<Option<Favorite>, RuntimeError> {
        self.request(|resp| Command::AddFavorite { favorite, resp }).await
    }

    /// Deletes a route by id. Returns `false` when it was already gone.
    pub async fn remove_favorite(&self, favorite: Favorite) -> Result<bool, RuntimeError> {
        self.request(|resp| Command::RemoveFavorite { favorite, resp })
            .await
    }

    /// First-run airport population.
    pub async fn seed_airports(&self, airports: Vec<Airport>) -> Result<usize, RuntimeError> {
        self.request(|resp| Command::SeedAirports { airports, resp }).await
    }

    /// Live airport search.
    pub async fn watch_search_airports(
        &self,
        substring: impl Into<String>,
    ) -> Result<LiveQuery<Airport>, RuntimeError> {
        self.watch(SearchSource(substring.into())).await
    }

    /// Live destination candidates for a departure code.
    pub async fn watch_other_airports(
        &self,
        exclude_code: impl Into<String>,
    ) -> Result<LiveQuery<Airport>, RuntimeError> {
        self.watch(OtherAirportsSource(exclude_code.into())).await
    }

    /// Live joined favorite list.
    pub async fn watch_favorites(&self) -> Result<LiveQuery<FavoriteView>, RuntimeError> {
        self.watch(FavoritesSource).await
    }

    /// Stops the store loop after commands already queued.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    async fn watch<S: LiveSource>(&self, source: S) -> Result<LiveQuery<S::Item>, RuntimeError> {
        // Subscribe before the first read so no mutation slips between them.
        let events = self.subscribe();
        let initial = source.fetch(self).await?;
        Ok(LiveQuery::spawn(source, self.clone(), events, initial))
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(build(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }
}

async fn handle_command(
    cmd: Command,
    store: &SharedStore,
    events_tx: &broadcast::Sender<FlightEvent>,
) -> bool {
    match cmd {
        Command::SearchAirports { substring, resp } => {
            let res = run_blocking(store, move |s| s.search_airports(&substring)).await;
            let _ = resp.send(res);
        }
        Command::ListOtherAirports { exclude_code, resp } => {
            let res = run_blocking(store, move |s| s.list_other_airports(&exclude_code)).await;
            let _ = resp.send(res);
        }
        Command::ListFavorites { resp } => {
            let res = run_blocking(store, |s| s.list_favorites()).await;
            let _ = resp.send(res);
        }
        Command::FindFavorite {
            departure_code,
            destination_code,
            resp,
        } => {
            let res = run_blocking(store, move |s| {
                s.find_favorite(&departure_code, &destination_code)
            })
            .await;
            let _ = resp.send(res);
        }
        Command::AddFavorite { favorite, resp } => {
            let res = run_blocking(store, move |s| s.add_favorite(favorite)).await;
            match &res {
                Ok(Some(saved)) => {
                    tracing::debug!(
                        id = saved.id,
                        departure = %saved.departure_code,
                        destination = %saved.destination_code,
                        "favorite added"
                    );
                    let _ = events_tx.send(FlightEvent::FavoriteAdded { id: saved.id });
                }
                Ok(None) => tracing::debug!("favorite already saved; insert ignored"),
                Err(err) => tracing::warn!(error = %err, "favorite insert failed"),
            }
            let _ = resp.send(res);
        }
        Command::RemoveFavorite { favorite, resp } => {
            let id = favorite.id;
            let res = run_blocking(store, move |s| s.remove_favorite(&favorite)).await;
            match &res {
                Ok(true) => {
                    tracing::debug!(id, "favorite removed");
                    let _ = events_tx.send(FlightEvent::FavoriteRemoved { id });
                }
                Ok(false) => tracing::debug!(id, "favorite already absent"),
                Err(err) => tracing::warn!(id, error = %err, "favorite delete failed"),
            }
            let _ = resp.send(res);
        }
        Command::SeedAirports { airports, resp } => {
            let res = run_blocking(store, move |s| s.seed_airports(&airports)).await;
            if let Ok(count @ 1..) = res {
                let _ = events_tx.send(FlightEvent::AirportsSeeded { count });
            }
            let _ = resp.send(res);
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}

async fn run_blocking<T, F>(store: &SharedStore, f: F) -> Result<T, RuntimeError>
where
    T: Send + 'static,
    F: FnOnce(&mut Box<dyn FlightStore>) -> StoreResult<T> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || {
        let mut guard = store.blocking_lock();
        f(&mut guard)
    })
    .await
    .map_err(|e| RuntimeError::Join(e.to_string()))?
    .map_err(RuntimeError::from)
}
