use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::warn;

use crate::models::LocationEntry;

use super::{KvStore, GROUP_SECURE_PREFS};

const KEY_LOCATION_HISTORY: &str = "location_history";

/// Append-only location history, persisted as one JSON list.
pub struct LocationStore {
    kv: Arc<dyn KvStore>,
    write_guard: Mutex<()>,
    cache: Mutex<Vec<LocationEntry>>,
}

impl LocationStore {
    pub async fn new(kv: Arc<dyn KvStore>) -> Self {
        let entries = match kv.get(GROUP_SECURE_PREFS, KEY_LOCATION_HISTORY).await {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("Ignoring malformed location history: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read location history: {}", e);
                Vec::new()
            }
        };
        Self {
            kv,
            write_guard: Mutex::new(()),
            cache: Mutex::new(entries),
        }
    }

    pub async fn append(&self, entry: LocationEntry) -> bool {
        let _guard = self.write_guard.lock().await;
        let mut entries = self.cache.lock().await.clone();
        entries.push(entry);
        if self.persist(&entries).await {
            *self.cache.lock().await = entries;
            true
        } else {
            false
        }
    }

    /// Entries with `start <= timestamp <= end`.
    pub async fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<LocationEntry> {
        self.cache
            .lock()
            .await
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
            .cloned()
            .collect()
    }

    pub async fn all(&self) -> Vec<LocationEntry> {
        self.cache.lock().await.clone()
    }

    pub async fn clear(&self) -> bool {
        let _guard = self.write_guard.lock().await;
        if self.persist(&Vec::<LocationEntry>::new()).await {
            self.cache.lock().await.clear();
            true
        } else {
            false
        }
    }

    async fn persist(&self, entries: &[LocationEntry]) -> bool {
        let json = match serde_json::to_string(entries) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize location history: {}", e);
                return false;
            }
        };
        match self.kv.put(GROUP_SECURE_PREFS, KEY_LOCATION_HISTORY, json).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to write location history: {}", e);
                false
            }
        }
    }
}
