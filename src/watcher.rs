//! Status watcher
//!
//! A background thread that polls `status` through a shared [`Client`] and
//! reports what changed between consecutive snapshots. It uses the same
//! connection and the same lock as every other caller.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{select, tick, unbounded, Receiver, Sender};

use crate::error::MpdError;
use crate::network::Client;
use crate::protocol::Record;

/// A change observed between two polls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A status field appeared, changed or disappeared
    Changed {
        key: String,
        previous: Option<String>,
        current: Option<String>,
    },

    /// Polling lost or regained the server
    Connection { connected: bool },
}

/// Events turning `previous` into `current`
///
/// Keys of `current` come first in their order, then keys that vanished.
pub fn diff_records(previous: Option<&Record>, current: &Record) -> Vec<WatchEvent> {
    let mut events = Vec::new();

    for key in current.keys() {
        let now = current.get(key);
        let before = previous.and_then(|p| p.get(key));
        if now != before {
            events.push(WatchEvent::Changed {
                key: key.to_string(),
                previous: before.map(str::to_string),
                current: now.map(str::to_string),
            });
        }
    }

    if let Some(previous) = previous {
        for key in previous.keys() {
            if !current.contains_key(key) {
                events.push(WatchEvent::Changed {
                    key: key.to_string(),
                    previous: previous.get(key).map(str::to_string),
                    current: None,
                });
            }
        }
    }

    events
}

/// Handle to the polling thread; stops it when dropped
pub struct Watcher {
    shutdown: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    events: Receiver<WatchEvent>,
}

impl Watcher {
    /// Start polling every `interval`
    pub fn spawn(client: Arc<Client>, interval: Duration) -> Self {
        let (event_tx, event_rx) = unbounded();
        let (shutdown_tx, shutdown_rx) = unbounded::<()>();

        let handle = thread::Builder::new()
            .name("mpdwire-watcher".to_string())
            .spawn(move || poll_loop(client, interval, event_tx, shutdown_rx))
            .ok();

        if handle.is_none() {
            tracing::error!("failed to spawn watcher thread");
        }

        Self {
            shutdown: Some(shutdown_tx),
            handle,
            events: event_rx,
        }
    }

    /// Stream of change events
    pub fn events(&self) -> &Receiver<WatchEvent> {
        &self.events
    }

    /// Stop polling and wait for the thread to exit
    pub fn stop(&mut self) {
        // Dropping the sender disconnects the shutdown channel
        self.shutdown.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("watcher thread panicked");
            }
        }
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_loop(
    client: Arc<Client>,
    interval: Duration,
    events: Sender<WatchEvent>,
    shutdown: Receiver<()>,
) {
    let ticker = tick(interval);
    let mut previous: Option<Record> = None;
    let mut connected = true;

    tracing::debug!("watcher started, polling every {:?}", interval);

    loop {
        if !poll_once(&client, &mut previous, &mut connected, &events) {
            tracing::debug!("watcher receiver dropped");
            break;
        }

        select! {
            recv(shutdown) -> _ => break,
            recv(ticker) -> _ => {}
        }
    }

    tracing::debug!("watcher stopped");
}

/// Returns false once nobody listens any more
fn poll_once(
    client: &Client,
    previous: &mut Option<Record>,
    connected: &mut bool,
    events: &Sender<WatchEvent>,
) -> bool {
    match client.status() {
        Ok(status) => {
            if !*connected {
                *connected = true;
                tracing::info!("watcher reconnected");
                if events.send(WatchEvent::Connection { connected: true }).is_err() {
                    return false;
                }
            }
            for event in diff_records(previous.as_ref(), &status) {
                if events.send(event).is_err() {
                    return false;
                }
            }
            *previous = Some(status);
        }
        Err(e @ (MpdError::Transport(_) | MpdError::NotConnected | MpdError::Handshake(_))) => {
            if *connected {
                *connected = false;
                tracing::warn!("watcher lost the server: {}", e);
                if events.send(WatchEvent::Connection { connected: false }).is_err() {
                    return false;
                }
            }
        }
        Err(e) => tracing::warn!("status poll failed: {}", e),
    }
    true
}
