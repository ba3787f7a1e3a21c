use std::sync::Arc;

use tracing::warn;

use crate::enums::SecurityEventType;
use crate::models::{LocationEntry, LocationFix, SecurityEvent};
use crate::store::{EventStore, UserStore};

use super::LocationTracker;

/// Location-tracking toggle surface: flips the persisted flag, starts
/// or stops the tracker to match, and logs each transition.
pub struct LocationTrackingService {
    users: Arc<UserStore>,
    events: Arc<EventStore>,
    tracker: Arc<LocationTracker>,
}

impl LocationTrackingService {
    pub fn new(users: Arc<UserStore>, events: Arc<EventStore>, tracker: Arc<LocationTracker>) -> Self {
        Self {
            users,
            events,
            tracker,
        }
    }

    pub async fn enable(&self) -> bool {
        let mut settings = self.users.get_security_settings().await;
        settings.location_tracking_enabled = true;
        if !self.users.update_security_settings(settings).await {
            return false;
        }
        if !self.tracker.start_tracking().await {
            warn!("Location tracking enabled but the tracker could not start");
        }
        self.events
            .log_security_event(SecurityEvent::new(
                SecurityEventType::DeviceLocationChanged,
                "Location tracking enabled",
            ))
            .await
    }

    pub async fn disable(&self) -> bool {
        let mut settings = self.users.get_security_settings().await;
        settings.location_tracking_enabled = false;
        if !self.users.update_security_settings(settings).await {
            return false;
        }
        self.tracker.stop_tracking().await;
        self.events
            .log_security_event(SecurityEvent::new(
                SecurityEventType::DeviceLocationChanged,
                "Location tracking disabled",
            ))
            .await
    }

    pub async fn is_enabled(&self) -> bool {
        self.users.get_security_settings().await.location_tracking_enabled
    }

    pub async fn is_tracking(&self) -> bool {
        self.tracker.is_active().await
    }

    pub async fn current_location(&self) -> Option<LocationFix> {
        self.tracker.current_location().await
    }

    pub async fn history_between(
        &self,
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    ) -> Vec<LocationEntry> {
        self.tracker.history_between(start, end).await
    }

    pub async fn clear_history(&self) -> bool {
        self.tracker.clear_history().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::ManualLocationSource;
    use crate::store::{LocationStore, MemoryKvStore};
    use std::time::Duration;

    async fn service() -> (LocationTrackingService, Arc<EventStore>) {
        let kv = Arc::new(MemoryKvStore::new());
        let users = Arc::new(UserStore::new(kv.clone()).await);
        let events = Arc::new(EventStore::new(kv.clone()).await);
        let tracker = Arc::new(LocationTracker::new(
            Arc::new(ManualLocationSource::default()),
            Arc::new(LocationStore::new(kv).await),
            Duration::from_secs(10),
            Duration::from_secs(5),
        ));
        (
            LocationTrackingService::new(users, events.clone(), tracker),
            events,
        )
    }

    #[tokio::test]
    async fn test_enable_starts_tracker_and_logs_transition() {
        let (service, events) = service().await;
        assert!(!service.is_enabled().await);
        assert!(!service.is_tracking().await);

        assert!(service.enable().await);
        assert!(service.is_enabled().await);
        assert!(service.is_tracking().await);

        let logged = events
            .get_events_by_type(SecurityEventType::DeviceLocationChanged)
            .await;
        assert_eq!(logged.len(), 1);
        assert!(logged[0].description.contains("enabled"));
    }

    #[tokio::test]
    async fn test_disable_stops_tracker_and_logs_transition() {
        let (service, events) = service().await;
        assert!(service.enable().await);
        assert!(service.disable().await);
        assert!(!service.is_enabled().await);
        assert!(!service.is_tracking().await);

        let logged = events
            .get_events_by_type(SecurityEventType::DeviceLocationChanged)
            .await;
        assert_eq!(logged.len(), 2);
        assert!(logged[1].description.contains("disabled"));
    }
}
