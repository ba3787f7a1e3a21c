use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tracing::warn;
use uuid::Uuid;

use crate::enums::SecurityEventType;
use crate::models::{IntruderEvent, SecurityEvent};

use super::{KvStore, GROUP_SECURE_PREFS};

const KEY_SECURITY_EVENTS: &str = "security_events";
const KEY_INTRUDER_EVENTS: &str = "intruder_events";

/// Append-only log of security events plus the richer intruder records.
/// Every mutation re-serializes the whole list under the write guard
/// (copy-modify-write-back), so concurrent writers cannot drop entries.
pub struct EventStore {
    kv: Arc<dyn KvStore>,
    write_guard: Mutex<()>,
    events_tx: watch::Sender<Vec<SecurityEvent>>,
    intruders_tx: watch::Sender<Vec<IntruderEvent>>,
}

impl EventStore {
    pub async fn new(kv: Arc<dyn KvStore>) -> Self {
        let events = Self::load(&*kv, KEY_SECURITY_EVENTS).await;
        let intruders = Self::load(&*kv, KEY_INTRUDER_EVENTS).await;
        Self {
            kv,
            write_guard: Mutex::new(()),
            events_tx: watch::Sender::new(events),
            intruders_tx: watch::Sender::new(intruders),
        }
    }

    async fn load<T: serde::de::DeserializeOwned + Default>(kv: &dyn KvStore, key: &str) -> T {
        match kv.get(GROUP_SECURE_PREFS, key).await {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                warn!("Ignoring malformed {}: {}", key, e);
                T::default()
            }),
            Ok(None) => T::default(),
            Err(e) => {
                warn!("Failed to read {}: {}", key, e);
                T::default()
            }
        }
    }

    async fn persist<T: serde::Serialize>(&self, key: &str, value: &T) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize {}: {}", key, e);
                return false;
            }
        };
        match self.kv.put(GROUP_SECURE_PREFS, key, json).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to write {}: {}", key, e);
                false
            }
        }
    }

    // ─── Security events ─────────────────────────────────────────────

    pub async fn log_security_event(&self, event: SecurityEvent) -> bool {
        self.mutate_events(|events| {
            events.push(event);
            true
        })
        .await
    }

    pub async fn get_all_security_events(&self) -> Vec<SecurityEvent> {
        self.events_tx.borrow().clone()
    }

    pub async fn get_events_by_type(&self, event_type: SecurityEventType) -> Vec<SecurityEvent> {
        self.events_tx
            .borrow()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Events with `start <= timestamp <= end`.
    pub async fn get_events_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<SecurityEvent> {
        self.events_tx
            .borrow()
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
            .cloned()
            .collect()
    }

    pub async fn latest_security_event(&self) -> Option<SecurityEvent> {
        self.events_tx
            .borrow()
            .iter()
            .max_by_key(|e| e.timestamp)
            .cloned()
    }

    pub async fn mark_event_handled(&self, event_id: Uuid) -> bool {
        self.mutate_events(|events| {
            if let Some(event) = events.iter_mut().find(|e| e.id == event_id) {
                event.is_handled = true;
                true
            } else {
                false
            }
        })
        .await
    }

    pub async fn delete_security_event(&self, event_id: Uuid) -> bool {
        self.mutate_events(|events| {
            let before = events.len();
            events.retain(|e| e.id != event_id);
            events.len() != before
        })
        .await
    }

    pub fn security_events_updates(&self) -> watch::Receiver<Vec<SecurityEvent>> {
        self.events_tx.subscribe()
    }

    async fn mutate_events<F>(&self, mutate: F) -> bool
    where
        F: FnOnce(&mut Vec<SecurityEvent>) -> bool,
    {
        let _guard = self.write_guard.lock().await;
        let mut events = self.events_tx.borrow().clone();
        if !mutate(&mut events) {
            return false;
        }
        let ok = self.persist(KEY_SECURITY_EVENTS, &events).await;
        if ok {
            self.events_tx.send_replace(events);
        }
        ok
    }

    // ─── Intruder events ─────────────────────────────────────────────

    pub async fn record_intruder_event(&self, event: IntruderEvent) -> bool {
        let _guard = self.write_guard.lock().await;
        let mut events = self.intruders_tx.borrow().clone();
        events.push(event);
        let ok = self.persist(KEY_INTRUDER_EVENTS, &events).await;
        if ok {
            self.intruders_tx.send_replace(events);
        }
        ok
    }

    pub async fn get_intruder_events(&self) -> Vec<IntruderEvent> {
        self.intruders_tx.borrow().clone()
    }

    pub async fn delete_intruder_event(&self, event_id: Uuid) -> bool {
        let _guard = self.write_guard.lock().await;
        let mut events = self.intruders_tx.borrow().clone();
        let before = events.len();
        events.retain(|e| e.id != event_id);
        if events.len() == before {
            return false;
        }
        let ok = self.persist(KEY_INTRUDER_EVENTS, &events).await;
        if ok {
            self.intruders_tx.send_replace(events);
        }
        ok
    }

    pub fn intruder_events_updates(&self) -> watch::Receiver<Vec<IntruderEvent>> {
        self.intruders_tx.subscribe()
    }
}
