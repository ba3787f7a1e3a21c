use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::enums::{IntruderTrigger, SecurityEventType};
use crate::models::{IntruderEvent, IntruderLocation, SecurityEvent};
use crate::providers::DeviceStatus;
use crate::store::{EventStore, UserStore};

use super::LocationTracker;

/// Intruder-detection surface: toggle, threshold management and manual
/// event recording with the device snapshot attached.
pub struct IntruderService {
    users: Arc<UserStore>,
    events: Arc<EventStore>,
    tracker: Arc<LocationTracker>,
    device_status: Arc<dyn DeviceStatus>,
}

impl IntruderService {
    pub fn new(
        users: Arc<UserStore>,
        events: Arc<EventStore>,
        tracker: Arc<LocationTracker>,
        device_status: Arc<dyn DeviceStatus>,
    ) -> Self {
        Self {
            users,
            events,
            tracker,
            device_status,
        }
    }

    pub async fn enable(&self) -> bool {
        let mut settings = self.users.get_security_settings().await;
        settings.intruder_detection_enabled = true;
        self.users.update_security_settings(settings).await
    }

    pub async fn disable(&self) -> bool {
        let mut settings = self.users.get_security_settings().await;
        settings.intruder_detection_enabled = false;
        self.users.update_security_settings(settings).await
    }

    pub async fn is_enabled(&self) -> bool {
        self.users.get_security_settings().await.intruder_detection_enabled
    }

    pub async fn wrong_password_threshold(&self) -> u32 {
        self.users.get_security_settings().await.wrong_password_attempts
    }

    pub async fn set_wrong_password_threshold(&self, attempts: u32) -> bool {
        let mut settings = self.users.get_security_settings().await;
        settings.wrong_password_attempts = attempts;
        self.users.update_security_settings(settings).await
    }

    /// Records an intruder sighting: a security event plus the richer
    /// intruder record with photo, location and device snapshot.
    pub async fn record_intruder_event(
        &self,
        trigger: IntruderTrigger,
        photo_path: Option<String>,
        description: impl Into<String>,
    ) -> bool {
        let location = self.tracker.current_location().await;

        let logged = self
            .events
            .log_security_event(
                SecurityEvent::new(SecurityEventType::IntruderDetected, description)
                    .with_location(location.as_ref())
                    .with_photo(photo_path.clone()),
            )
            .await;

        let recorded = self
            .events
            .record_intruder_event(IntruderEvent {
                id: Uuid::new_v4(),
                timestamp: Utc::now(),
                photo_path,
                location: location.as_ref().map(|fix| IntruderLocation {
                    latitude: fix.latitude,
                    longitude: fix.longitude,
                    accuracy: fix.accuracy,
                }),
                trigger,
                device: self.device_status.snapshot().await,
            })
            .await;

        logged && recorded
    }

    pub async fn intruder_sightings(&self) -> Vec<SecurityEvent> {
        self.events
            .get_events_by_type(SecurityEventType::IntruderDetected)
            .await
    }
}
