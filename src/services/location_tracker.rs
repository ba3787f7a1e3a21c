use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::models::{LocationEntry, LocationFix};
use crate::providers::LocationSource;
use crate::store::LocationStore;

/// Coordinates continuous location acquisition: one subscription to the
/// platform source at a time, every received fix appended to history
/// and fanned out to live observers.
pub struct LocationTracker {
    source: Arc<dyn LocationSource>,
    store: Arc<LocationStore>,
    interval: Duration,
    fastest: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
    updates_tx: broadcast::Sender<LocationFix>,
}

impl LocationTracker {
    pub fn new(
        source: Arc<dyn LocationSource>,
        store: Arc<LocationStore>,
        interval: Duration,
        fastest: Duration,
    ) -> Self {
        let (updates_tx, _) = broadcast::channel(32);
        Self {
            source,
            store,
            interval,
            fastest,
            task: Mutex::new(None),
            updates_tx,
        }
    }

    /// Idempotent: a second call while tracking is a no-op success and
    /// opens no duplicate subscription.
    pub async fn start_tracking(&self) -> bool {
        let mut task = self.task.lock().await;
        if let Some(handle) = task.as_ref() {
            if !handle.is_finished() {
                debug!("Location tracking already active");
                return true;
            }
        }

        let mut rx = match self.source.start_updates(self.interval, self.fastest).await {
            Ok(rx) => rx,
            Err(e) => {
                warn!("Failed to start location updates: {}", e);
                return false;
            }
        };

        let store = self.store.clone();
        let updates_tx = self.updates_tx.clone();
        *task = Some(tokio::spawn(async move {
            while let Some(fix) = rx.recv().await {
                if !store.append(LocationEntry::from_fix(&fix)).await {
                    warn!("Dropping location fix: history write failed");
                }
                let _ = updates_tx.send(fix);
            }
            debug!("Location update stream closed");
        }));
        true
    }

    /// Idempotent: stopping when not active is a success with no side
    /// effects. Aborting the task drops the source receiver, which
    /// cancels the underlying acquisition.
    pub async fn stop_tracking(&self) -> bool {
        let mut task = self.task.lock().await;
        if let Some(handle) = task.take() {
            handle.abort();
        }
        true
    }

    pub async fn is_active(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Best-effort single fix; `None` when the platform has neither a
    /// fresh nor a last-known location.
    pub async fn current_location(&self) -> Option<LocationFix> {
        self.source.current_fix().await
    }

    /// Live fix stream while tracking is active. Lagging receivers drop
    /// the oldest fixes.
    pub fn updates(&self) -> broadcast::Receiver<LocationFix> {
        self.updates_tx.subscribe()
    }

    pub async fn history_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<LocationEntry> {
        self.store.between(start, end).await
    }

    pub async fn clear_history(&self) -> bool {
        self.store.clear().await
    }
}
