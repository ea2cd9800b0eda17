use std::sync::Arc;

use hashbrown::HashMap;
use tokio::{
    sync::{Mutex, mpsc, oneshot},
    time::{Duration, Instant},
};

use crate::{
    config::RuntimeConfig,
    prefs::{PreferenceStore, PrefsError},
};

use super::handle::RuntimeError;

type SharedPrefs = Arc<Mutex<Box<dyn PreferenceStore>>>;

enum PrefMsg {
    Set {
        key: String,
        value: String,
    },
    Get {
        key: String,
        resp: oneshot::Sender<Result<Option<String>, PrefsError>>,
    },
    Flush {
        resp: oneshot::Sender<Result<(), PrefsError>>,
    },
    Shutdown {
        resp: oneshot::Sender<Result<(), PrefsError>>,
    },
}

/// Clonable handle to the preference writer.
///
/// Writes are fire-and-forget: they are queued, coalesced per key for
/// `pref_debounce_ms`, and only the last value for each key is written.
/// Reads see queued values before they reach the store.
#[derive(Clone)]
pub struct PreferenceHandle {
    tx: mpsc::UnboundedSender<PrefMsg>,
}

/// Starts the preference writer on the current tokio runtime.
pub fn spawn_preference_writer(
    store: Box<dyn PreferenceStore>,
    config: &RuntimeConfig,
) -> PreferenceHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<PrefMsg>();
    let store: SharedPrefs = Arc::new(Mutex::new(store));
    let debounce = Duration::from_millis(config.pref_debounce_ms);

    tokio::spawn(async move {
        let mut pending = HashMap::<String, String>::new();
        let mut deadline = Instant::now() + debounce;

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else {
                        let _ = flush_pending(&store, &mut pending).await;
                        break;
                    };

                    match msg {
                        PrefMsg::Set { key, value } => {
                            if pending.is_empty() {
                                deadline = Instant::now() + debounce;
                            }
                            pending.insert(key, value);
                        }
                        PrefMsg::Get { key, resp } => {
                            let res = match pending.get(&key) {
                                Some(value) => Ok(Some(value.clone())),
                                None => read_value(&store, key).await,
                            };
                            let _ = resp.send(res);
                        }
                        PrefMsg::Flush { resp } => {
                            let _ = resp.send(flush_pending(&store, &mut pending).await);
                        }
                        PrefMsg::Shutdown { resp } => {
                            let _ = resp.send(flush_pending(&store, &mut pending).await);
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep_until(deadline), if !pending.is_empty() => {
                    let _ = flush_pending(&store, &mut pending).await;
                }
            }
        }
        tracing::debug!("preference writer stopped");
    });

    PreferenceHandle { tx }
}

impl PreferenceHandle {
    /// Queues a write. Never fails; a write that cannot be delivered or
    /// stored is logged and dropped.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if self
            .tx
            .send(PrefMsg::Set {
                key: key.clone(),
                value: value.into(),
            })
            .is_err()
        {
            tracing::warn!(%key, "preference writer closed; write dropped");
        }
    }

    /// Current value, including writes still queued.
    pub async fn get(&self, key: impl Into<String>) -> Result<Option<String>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(PrefMsg::Get {
                key: key.into(),
                resp: tx,
            })
            .map_err(|_| RuntimeError::ChannelClosed)?;
        Ok(rx.await.map_err(|_| RuntimeError::ChannelClosed)??)
    }

    /// Writes every queued value now.
    pub async fn flush(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(PrefMsg::Flush { resp: tx })
            .map_err(|_| RuntimeError::ChannelClosed)?;
        Ok(rx.await.map_err(|_| RuntimeError::ChannelClosed)??)
    }

    /// Flushes queued values and stops the writer.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(PrefMsg::Shutdown { resp: tx })
            .map_err(|_| RuntimeError::ChannelClosed)?;
        Ok(rx.await.map_err(|_| RuntimeError::ChannelClosed)??)
    }
}

async fn read_value(store: &SharedPrefs, key: String) -> Result<Option<String>, PrefsError> {
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || {
        let store = store.blocking_lock();
        store.get(&key)
    })
    .await
    .map_err(|e| PrefsError::Message(format!("join error: {e}")))?
}

async fn flush_pending(
    store: &SharedPrefs,
    pending: &mut HashMap<String, String>,
) -> Result<(), PrefsError> {
    if pending.is_empty() {
        return Ok(());
    }

    let batch = std::mem::take(pending);
    let store = Arc::clone(store);
    let res = tokio::task::spawn_blocking(move || {
        let mut store = store.blocking_lock();
        let mut first_err = None;
        for (key, value) in &batch {
            if let Err(err) = store.set(key, value) {
                tracing::warn!(%key, error = %err, "preference write failed");
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    })
    .await
    .map_err(|e| PrefsError::Message(format!("join error: {e}")))?;

    if res.is_ok() {
        tracing::debug!("preferences flushed");
    }
    res
}
