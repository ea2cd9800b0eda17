//! Live queries: a snapshot on subscribe, then a fresh snapshot after every
//! relevant change.

use std::future::Future;

use tokio::sync::{broadcast, watch};

use crate::airport::{Airport, FavoriteView};

use super::{
    events::FlightEvent,
    handle::{FlightSearchHandle, RuntimeError},
};

/// Query that can be re-run when the store changes.
pub trait LiveSource: Send + Sync + 'static {
    /// Row type.
    type Item: Clone + PartialEq + Send + Sync + 'static;

    /// True when `event` may change this query's result.
    fn is_relevant(&self, event: &FlightEvent) -> bool;

    /// Runs the query once.
    fn fetch(
        &self,
        handle: &FlightSearchHandle,
    ) -> impl Future<Output = Result<Vec<Self::Item>, RuntimeError>> + Send;
}

/// Airports matching a search string.
#[derive(Debug, Clone)]
pub struct SearchSource(pub String);

/// Airports other than one code.
#[derive(Debug, Clone)]
pub struct OtherAirportsSource(pub String);

/// Joined favorite list.
#[derive(Debug, Clone, Copy)]
pub struct FavoritesSource;

impl LiveSource for SearchSource {
    type Item = Airport;

    fn is_relevant(&self, event: &FlightEvent) -> bool {
        event.touches_airports()
    }

    fn fetch(
        &self,
        handle: &FlightSearchHandle,
    ) -> impl Future<Output = Result<Vec<Airport>, RuntimeError>> + Send {
        handle.search_airports(self.0.clone())
    }
}

impl LiveSource for OtherAirportsSource {
    type Item = Airport;

    fn is_relevant(&self, event: &FlightEvent) -> bool {
        event.touches_airports()
    }

    fn fetch(
        &self,
        handle: &FlightSearchHandle,
    ) -> impl Future<Output = Result<Vec<Airport>, RuntimeError>> + Send {
        handle.list_other_airports(self.0.clone())
    }
}

impl LiveSource for FavoritesSource {
    type Item = FavoriteView;

    fn is_relevant(&self, event: &FlightEvent) -> bool {
        event.touches_favorites()
    }

    fn fetch(
        &self,
        handle: &FlightSearchHandle,
    ) -> impl Future<Output = Result<Vec<FavoriteView>, RuntimeError>> + Send {
        handle.list_favorites()
    }
}

/// Continuously updated query result.
///
/// Dropping every receiver stops the background refresh task.
#[derive(Debug, Clone)]
pub struct LiveQuery<T> {
    rx: watch::Receiver<Vec<T>>,
}

impl<T> LiveQuery<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub(crate) fn spawn<S>(
        source: S,
        handle: FlightSearchHandle,
        mut events: broadcast::Receiver<FlightEvent>,
        initial: Vec<T>,
    ) -> Self
    where
        S: LiveSource<Item = T>,
    {
        let (tx, rx) = watch::channel(initial);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    evt = events.recv() => {
                        let refresh = match evt {
                            Ok(evt) => source.is_relevant(&evt),
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                tracing::debug!(skipped, "live query lagged; refreshing");
                                true
                            }
                            Err(broadcast::error::RecvError::Closed) => break,
                        };
                        if !refresh {
                            continue;
                        }

                        match source.fetch(&handle).await {
                            Ok(items) => {
                                tx.send_if_modified(|current| {
                                    if *current == items {
                                        return false;
                                    }
                                    *current = items;
                                    true
                                });
                            }
                            Err(RuntimeError::ChannelClosed) => break,
                            Err(err) => {
                                tracing::warn!(error = %err, "live query refresh failed; keeping last snapshot");
                            }
                        }
                    }
                }
            }
        });

        Self { rx }
    }

    /// Latest snapshot.
    pub fn current(&self) -> Vec<T> {
        self.rx.borrow().clone()
    }

    /// Waits for the next snapshot that differs from the last one seen.
    /// Returns `None` once the query has stopped.
    pub async fn changed(&mut self) -> Option<Vec<T>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Underlying receiver, for callers that want to await it directly.
    pub fn receiver(&self) -> watch::Receiver<Vec<T>> {
        self.rx.clone()
    }
}
