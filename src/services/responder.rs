use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::enums::{IntruderTrigger, SecurityEventType};
use crate::models::{IntruderEvent, IntruderLocation, SecurityEvent};
use crate::providers::{Camera, DeviceLock, DeviceStatus, Notifier};
use crate::store::{EventStore, UserStore};

use super::LocationTracker;

/// Runs the response chain for each trigger. Every step after the gate
/// is best-effort: a failed photo capture or notification never stops
/// the event-log write or the steps after it.
pub struct Responder {
    users: Arc<UserStore>,
    events: Arc<EventStore>,
    tracker: Arc<LocationTracker>,
    camera: Arc<dyn Camera>,
    notifier: Arc<dyn Notifier>,
    lock: Arc<dyn DeviceLock>,
    device_status: Arc<dyn DeviceStatus>,
    // The camera is exclusive: one capture session at a time.
    camera_guard: tokio::sync::Mutex<()>,
}

impl Responder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<UserStore>,
        events: Arc<EventStore>,
        tracker: Arc<LocationTracker>,
        camera: Arc<dyn Camera>,
        notifier: Arc<dyn Notifier>,
        lock: Arc<dyn DeviceLock>,
        device_status: Arc<dyn DeviceStatus>,
    ) -> Self {
        Self {
            users,
            events,
            tracker,
            camera,
            notifier,
            lock,
            device_status,
            camera_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Photo capture behind the exclusivity guard. A request while a
    /// capture is already in flight is dropped and logged rather than
    /// queued.
    async fn capture_photo(&self) -> Option<String> {
        match self.camera_guard.try_lock() {
            Ok(_guard) => self.camera.capture_front_photo().await,
            Err(_) => {
                warn!("Photo capture skipped: another capture is in flight");
                None
            }
        }
    }

    async fn lock_device(&self) -> bool {
        if !self.lock.is_lock_authority_granted().await {
            warn!("Cannot lock device: lock authority not granted");
            return false;
        }
        self.lock.lock_now().await
    }

    // ─── SIM change ──────────────────────────────────────────────────

    /// Chain: photo → start tracking → log → notify contacts → lock.
    pub async fn handle_sim_change(&self, previous: Option<&str>, current: &str) -> bool {
        let security = self.users.get_security_settings().await;
        if !security.sim_change_alert_enabled {
            return false;
        }
        info!(?previous, %current, "Responding to SIM change");

        let photo = if security.capture_photo_on_sim_change {
            self.capture_photo().await
        } else {
            None
        };

        if !self.tracker.is_active().await && !self.tracker.start_tracking().await {
            warn!("Could not start location tracking after SIM change");
        }
        let location = self.tracker.current_location().await;

        let description = match previous {
            Some(previous) => format!("SIM card changed from {} to {}", previous, current),
            None => format!("SIM card changed to {}", current),
        };
        let logged = self
            .events
            .log_security_event(
                SecurityEvent::new(SecurityEventType::SimChange, description)
                    .with_location(location.as_ref())
                    .with_photo(photo),
            )
            .await;

        let user = self.users.get_current_user().await;
        let owner = user.as_ref().map(|u| u.name.as_str()).unwrap_or("the owner");
        let message = format!(
            "Security alert: the SIM card in {}'s phone was changed to {}.",
            owner, current
        );
        for contact in self.users.get_emergency_contacts().await {
            if !contact.notify_on_sim_change {
                continue;
            }
            if security.send_sms_on_sim_change && !self.notifier.send_text(&contact.phone, &message).await {
                warn!(contact = %contact.name, "SMS notification failed");
            }
            if security.send_email_on_sim_change && !contact.email.is_empty() {
                if !self.notifier.send_email(&contact.email, &message).await {
                    warn!(contact = %contact.name, "Email notification failed");
                }
            }
        }

        if security.lock_device_on_sim_change && !self.lock_device().await {
            warn!("Device lock after SIM change failed");
        }

        logged
    }

    // ─── Wrong password ──────────────────────────────────────────────

    /// Chain: photo → log security event + intruder record.
    pub async fn handle_wrong_password(&self) -> bool {
        let anti_theft = self.users.get_anti_theft_settings().await;
        if !anti_theft.wrong_password_detection_enabled {
            return false;
        }
        let security = self.users.get_security_settings().await;
        info!("Responding to wrong password threshold");

        let photo = if security.capture_photo_on_wrong_password {
            self.capture_photo().await
        } else {
            None
        };
        let location = self.tracker.current_location().await;

        let logged = self
            .events
            .log_security_event(
                SecurityEvent::new(
                    SecurityEventType::WrongPasswordAttempt,
                    "Wrong password attempt limit reached",
                )
                .with_location(location.as_ref())
                .with_photo(photo.clone()),
            )
            .await;

        let intruder = IntruderEvent {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            photo_path: photo,
            location: location.as_ref().map(|fix| IntruderLocation {
                latitude: fix.latitude,
                longitude: fix.longitude,
                accuracy: fix.accuracy,
            }),
            trigger: IntruderTrigger::WrongPassword,
            device: self.device_status.snapshot().await,
        };
        if !self.events.record_intruder_event(intruder).await {
            warn!("Failed to record intruder event for wrong password");
        }

        logged
    }

    // ─── Motion ──────────────────────────────────────────────────────

    /// Chain: log → notify contacts flagged for intruder alerts.
    pub async fn handle_motion(&self, magnitude: f64) -> bool {
        let anti_theft = self.users.get_anti_theft_settings().await;
        if !anti_theft.motion_detection_enabled {
            return false;
        }
        info!(magnitude, "Responding to motion");

        let logged = self
            .events
            .log_security_event(SecurityEvent::new(
                SecurityEventType::IntruderDetected,
                format!("Unauthorized movement detected (delta {:.1})", magnitude),
            ))
            .await;

        let message = "Security alert: unexpected movement of the protected device was detected.";
        for contact in self.users.get_emergency_contacts().await {
            if contact.notify_on_intruder && !self.notifier.send_text(&contact.phone, message).await {
                warn!(contact = %contact.name, "Motion notification failed");
            }
        }

        logged
    }

    // ─── Panic button ────────────────────────────────────────────────

    /// Chain: log (with location + audio) → ensure tracking → photo →
    /// notify contacts with the user's name and phone.
    pub async fn handle_panic(&self, audio_path: Option<String>) -> bool {
        let security = self.users.get_security_settings().await;
        if !security.panic_button_enabled {
            return false;
        }
        info!("Responding to panic button");

        let location = self.tracker.current_location().await;
        let logged = self
            .events
            .log_security_event(
                SecurityEvent::new(SecurityEventType::PanicButtonPressed, "Panic button was triggered")
                    .with_location(location.as_ref())
                    .with_audio(audio_path),
            )
            .await;

        if !self.tracker.is_active().await && !self.tracker.start_tracking().await {
            warn!("Could not start location tracking after panic");
        }

        let _ = self.capture_photo().await;

        let user = self.users.get_current_user().await;
        let (name, phone) = user
            .as_ref()
            .map(|u| (u.name.as_str(), u.phone.as_str()))
            .unwrap_or(("Unknown", "unknown"));
        let message = format!("EMERGENCY: {} ({}) triggered the panic button.", name, phone);
        for contact in self.users.get_emergency_contacts().await {
            if contact.notify_on_panic && !self.notifier.send_text(&contact.phone, &message).await {
                warn!(contact = %contact.name, "Panic notification failed");
            }
        }

        logged
    }

    // ─── Remote lock ─────────────────────────────────────────────────

    /// Chain: lock → log.
    pub async fn handle_remote_lock(&self) -> bool {
        let anti_theft = self.users.get_anti_theft_settings().await;
        if !anti_theft.remote_lock_enabled {
            return false;
        }
        info!("Responding to remote lock command");

        let locked = self.lock_device().await;
        let description = if locked {
            "Device locked remotely via secret code"
        } else {
            "Remote lock command received but locking failed"
        };
        self.events
            .log_security_event(SecurityEvent::new(
                SecurityEventType::IntruderDetected,
                description,
            ))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AntiTheftSettings, EmergencyContact, LocationFix, SecuritySettings, User,
    };
    use crate::providers::testing::{
        ManualLocationSource, RecordingCamera, RecordingLock, RecordingNotifier,
        StaticDeviceStatus,
    };
    use crate::store::{LocationStore, MemoryKvStore};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    struct Harness {
        users: Arc<UserStore>,
        events: Arc<EventStore>,
        tracker: Arc<LocationTracker>,
        source: Arc<ManualLocationSource>,
        camera: Arc<RecordingCamera>,
        notifier: Arc<RecordingNotifier>,
        lock: Arc<RecordingLock>,
        responder: Responder,
    }

    async fn harness() -> Harness {
        let kv = Arc::new(MemoryKvStore::new());
        let users = Arc::new(UserStore::new(kv.clone()).await);
        let events = Arc::new(EventStore::new(kv.clone()).await);
        let source = Arc::new(ManualLocationSource::default());
        let locations = Arc::new(LocationStore::new(kv).await);
        let tracker = Arc::new(LocationTracker::new(
            source.clone(),
            locations,
            Duration::from_secs(10),
            Duration::from_secs(5),
        ));
        let camera = Arc::new(RecordingCamera::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let lock = Arc::new(RecordingLock::default());
        let responder = Responder::new(
            users.clone(),
            events.clone(),
            tracker.clone(),
            camera.clone(),
            notifier.clone(),
            lock.clone(),
            Arc::new(StaticDeviceStatus),
        );
        Harness {
            users,
            events,
            tracker,
            source,
            camera,
            notifier,
            lock,
            responder,
        }
    }

    fn user_with_contact(contact: EmergencyContact) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Dilshod".to_string(),
            email: "dilshod@example.com".to_string(),
            phone: "+998901112233".to_string(),
            emergency_contacts: vec![contact],
            security_settings: SecuritySettings::default(),
        }
    }

    #[tokio::test]
    async fn test_sim_change_end_to_end() {
        let h = harness().await;
        let mut contact = EmergencyContact::new("Aziza", "+998909998877");
        contact.notify_on_sim_change = true;
        assert!(h.users.save_user(user_with_contact(contact)).await);
        assert!(
            h.users
                .update_security_settings(SecuritySettings {
                    sim_change_alert_enabled: true,
                    capture_photo_on_sim_change: true,
                    send_sms_on_sim_change: true,
                    send_email_on_sim_change: false,
                    lock_device_on_sim_change: false,
                    ..Default::default()
                })
                .await
        );
        h.source.set_fix(Some(LocationFix {
            latitude: 41.0,
            longitude: 69.0,
            accuracy: 10.0,
            timestamp: Utc::now(),
        }));

        assert!(h.responder.handle_sim_change(Some("1111"), "2222").await);

        let events = h.events.get_events_by_type(SecurityEventType::SimChange).await;
        assert_eq!(events.len(), 1);
        assert!(events[0].description.contains("2222"));
        assert!(events[0].photo_path.is_some());
        assert_eq!(events[0].latitude, Some(41.0));

        assert_eq!(h.notifier.texts.lock().unwrap().len(), 1);
        assert!(h.tracker.is_active().await);
        // Lock policy was off
        assert_eq!(h.lock.locks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sim_change_gate_disabled() {
        let h = harness().await;
        assert!(!h.responder.handle_sim_change(Some("1111"), "2222").await);
        assert!(h.events.get_all_security_events().await.is_empty());
        assert_eq!(h.camera.captures.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sim_change_logs_even_when_actions_fail() {
        let h = harness().await;
        let contact = EmergencyContact::new("Aziza", "+998909998877");
        assert!(h.users.save_user(user_with_contact(contact)).await);
        assert!(
            h.users
                .update_security_settings(SecuritySettings {
                    sim_change_alert_enabled: true,
                    ..Default::default()
                })
                .await
        );
        h.camera.fail.store(true, Ordering::SeqCst);
        h.notifier.fail.store(true, Ordering::SeqCst);
        h.lock.granted.store(false, Ordering::SeqCst);

        assert!(h.responder.handle_sim_change(None, "2222").await);

        // Event logged without a photo; the later steps still ran
        let events = h.events.get_events_by_type(SecurityEventType::SimChange).await;
        assert_eq!(events.len(), 1);
        assert!(events[0].photo_path.is_none());
        assert_eq!(h.notifier.texts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_password_records_both_events() {
        let h = harness().await;
        assert!(
            h.users
                .save_anti_theft_settings(AntiTheftSettings {
                    wrong_password_detection_enabled: true,
                    ..Default::default()
                })
                .await
        );

        assert!(h.responder.handle_wrong_password().await);

        let events = h
            .events
            .get_events_by_type(SecurityEventType::WrongPasswordAttempt)
            .await;
        assert_eq!(events.len(), 1);
        assert!(events[0].photo_path.is_some());

        let intruders = h.events.get_intruder_events().await;
        assert_eq!(intruders.len(), 1);
        assert_eq!(intruders[0].trigger, IntruderTrigger::WrongPassword);
        assert_eq!(intruders[0].device.device_id, "test-device");
    }

    #[tokio::test]
    async fn test_motion_notifies_intruder_contacts() {
        let h = harness().await;
        let mut listening = EmergencyContact::new("Aziza", "+998909998877");
        listening.notify_on_intruder = true;
        let mut silent = EmergencyContact::new("Bobur", "+998933334455");
        silent.notify_on_intruder = false;
        let mut user = user_with_contact(listening);
        user.emergency_contacts.push(silent);
        assert!(h.users.save_user(user).await);
        assert!(
            h.users
                .save_anti_theft_settings(AntiTheftSettings {
                    motion_detection_enabled: true,
                    ..Default::default()
                })
                .await
        );

        assert!(h.responder.handle_motion(9.4).await);

        let texts = h.notifier.texts.lock().unwrap();
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0].0, "+998909998877");
    }

    #[tokio::test]
    async fn test_panic_with_no_contacts() {
        let h = harness().await;
        assert!(
            h.users
                .update_security_settings(SecuritySettings {
                    panic_button_enabled: true,
                    ..Default::default()
                })
                .await
        );

        // No user, no contacts: event logs, nothing is sent
        assert!(h.responder.handle_panic(None).await);
        let events = h
            .events
            .get_events_by_type(SecurityEventType::PanicButtonPressed)
            .await;
        assert_eq!(events.len(), 1);
        assert!(h.notifier.texts.lock().unwrap().is_empty());
        assert!(h.tracker.is_active().await);
    }

    #[tokio::test]
    async fn test_panic_message_includes_user_identity() {
        let h = harness().await;
        let contact = EmergencyContact::new("Aziza", "+998909998877");
        assert!(h.users.save_user(user_with_contact(contact)).await);
        assert!(
            h.users
                .update_security_settings(SecuritySettings {
                    panic_button_enabled: true,
                    ..Default::default()
                })
                .await
        );

        assert!(h.responder.handle_panic(Some("/data/audio/panic.m4a".to_string())).await);

        let texts = h.notifier.texts.lock().unwrap();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].1.contains("Dilshod"));
        assert!(texts[0].1.contains("+998901112233"));
        drop(texts);

        let events = h
            .events
            .get_events_by_type(SecurityEventType::PanicButtonPressed)
            .await;
        assert_eq!(events[0].audio_path.as_deref(), Some("/data/audio/panic.m4a"));
    }

    #[tokio::test]
    async fn test_remote_lock_locks_and_logs() {
        let h = harness().await;
        assert!(
            h.users
                .save_anti_theft_settings(AntiTheftSettings {
                    remote_lock_enabled: true,
                    secret_code: "LOCKDOWN".to_string(),
                    ..Default::default()
                })
                .await
        );

        assert!(h.responder.handle_remote_lock().await);
        assert_eq!(h.lock.locks.load(Ordering::SeqCst), 1);
        let events = h.events.get_all_security_events().await;
        assert_eq!(events.len(), 1);
        assert!(events[0].description.contains("locked remotely"));
    }
}
