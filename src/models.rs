use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{IntruderTrigger, SecurityEventType};

// ─── User & contacts ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub emergency_contacts: Vec<EmergencyContact>,
    #[serde(default)]
    pub security_settings: SecuritySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub notify_on_sim_change: bool,
    pub notify_on_intruder: bool,
    pub notify_on_panic: bool,
}

impl EmergencyContact {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            phone: phone.into(),
            email: String::new(),
            notify_on_sim_change: true,
            notify_on_intruder: true,
            notify_on_panic: true,
        }
    }
}

// ─── Settings ────────────────────────────────────────────────────────

/// Per-feature toggles and response-policy flags. Replaced as a whole
/// on every settings update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecuritySettings {
    pub fake_shutdown_enabled: bool,
    pub intruder_detection_enabled: bool,
    pub location_tracking_enabled: bool,
    pub sim_change_alert_enabled: bool,
    pub panic_button_enabled: bool,
    pub remote_control_enabled: bool,
    pub lock_device_on_sim_change: bool,
    pub capture_photo_on_wrong_password: bool,
    pub capture_photo_on_sim_change: bool,
    pub send_sms_on_sim_change: bool,
    pub send_email_on_sim_change: bool,
    pub wrong_password_attempts: u32,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            fake_shutdown_enabled: false,
            intruder_detection_enabled: false,
            location_tracking_enabled: false,
            sim_change_alert_enabled: false,
            panic_button_enabled: false,
            remote_control_enabled: false,
            lock_device_on_sim_change: true,
            capture_photo_on_wrong_password: true,
            capture_photo_on_sim_change: true,
            send_sms_on_sim_change: true,
            send_email_on_sim_change: true,
            wrong_password_attempts: 3,
        }
    }
}

/// The feature bundle the anti-theft monitor consumes directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntiTheftSettings {
    pub sim_change_detection_enabled: bool,
    pub motion_detection_enabled: bool,
    /// 1-10 scale; higher is more sensitive.
    pub motion_sensitivity: u8,
    pub wrong_password_detection_enabled: bool,
    pub max_password_attempts: u32,
    pub remote_lock_enabled: bool,
    pub secret_code: String,
}

impl Default for AntiTheftSettings {
    fn default() -> Self {
        Self {
            sim_change_detection_enabled: false,
            motion_detection_enabled: false,
            motion_sensitivity: 5,
            wrong_password_detection_enabled: false,
            max_password_attempts: 3,
            remote_lock_enabled: false,
            secret_code: String::new(),
        }
    }
}

impl AntiTheftSettings {
    /// True when no capability is enabled, in which case the monitor
    /// has nothing to register and stays stopped.
    pub fn all_disabled(&self) -> bool {
        !self.sim_change_detection_enabled
            && !self.motion_detection_enabled
            && !self.wrong_password_detection_enabled
            && !self.remote_lock_enabled
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordSettings {
    pub password_enabled: bool,
    /// Stored as entered. This is not a secure credential store: the
    /// original product displays the password back to the owner, so a
    /// hash-and-compare scheme would change observable behavior.
    pub password: String,
    pub use_biometric: bool,
    pub lock_after_timeout: bool,
    pub timeout_minutes: u32,
    pub failed_attempts: u32,
    pub max_failed_attempts: u32,
    /// Epoch millis of the most recent failed attempt, 0 when none.
    pub last_failed_timestamp: i64,
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            password_enabled: false,
            password: String::new(),
            use_biometric: false,
            lock_after_timeout: false,
            timeout_minutes: 5,
            failed_attempts: 0,
            max_failed_attempts: 5,
            last_failed_timestamp: 0,
        }
    }
}

// ─── Events ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: Uuid,
    pub event_type: SecurityEventType,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_handled: bool,
}

impl SecurityEvent {
    pub fn new(event_type: SecurityEventType, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            timestamp: Utc::now(),
            latitude: None,
            longitude: None,
            photo_path: None,
            audio_path: None,
            description: description.into(),
            is_handled: false,
        }
    }

    pub fn with_location(mut self, fix: Option<&LocationFix>) -> Self {
        if let Some(fix) = fix {
            self.latitude = Some(fix.latitude);
            self.longitude = Some(fix.longitude);
        }
        self
    }

    pub fn with_photo(mut self, path: Option<String>) -> Self {
        self.photo_path = path;
        self
    }

    pub fn with_audio(mut self, path: Option<String>) -> Self {
        self.audio_path = path;
        self
    }
}

/// Device state captured alongside an intruder event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub device_id: String,
    pub battery_level: i32,
    pub is_charging: bool,
    pub network_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sim_serial: Option<String>,
}

/// Richer record produced by the intruder-detection pathway. Kept
/// separate from [`SecurityEvent`]: the snapshot fields only make sense
/// for this one pathway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntruderEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<IntruderLocation>,
    pub trigger: IntruderTrigger,
    pub device: DeviceSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntruderLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f32,
}

// ─── Location ────────────────────────────────────────────────────────

/// A single fix from the platform location source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f32,
    pub timestamp: DateTime<Utc>,
}

/// One persisted location-history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEntry {
    pub id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f32,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<i32>,
    #[serde(default)]
    pub from_emergency_alert: bool,
}

impl LocationEntry {
    pub fn from_fix(fix: &LocationFix) -> Self {
        Self {
            id: Uuid::new_v4(),
            latitude: fix.latitude,
            longitude: fix.longitude,
            accuracy: fix.accuracy,
            timestamp: fix.timestamp,
            address: None,
            battery_level: None,
            from_emergency_alert: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_settings_defaults() {
        let settings = SecuritySettings::default();
        assert!(!settings.sim_change_alert_enabled);
        assert!(settings.lock_device_on_sim_change);
        assert!(settings.capture_photo_on_wrong_password);
        assert_eq!(settings.wrong_password_attempts, 3);
    }

    #[test]
    fn test_anti_theft_all_disabled() {
        assert!(AntiTheftSettings::default().all_disabled());
        let enabled = AntiTheftSettings {
            remote_lock_enabled: true,
            ..Default::default()
        };
        assert!(!enabled.all_disabled());
    }

    #[test]
    fn test_event_serialization_round_trip() {
        let event = SecurityEvent::new(SecurityEventType::SimChange, "SIM card changed")
            .with_location(Some(&LocationFix {
                latitude: 41.31,
                longitude: 69.24,
                accuracy: 12.5,
                timestamp: Utc::now(),
            }))
            .with_photo(Some("/data/photos/abc.jpg".to_string()));

        let json = serde_json::to_string(&event).unwrap();
        let back: SecurityEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
        assert!(json.contains("SIM_CHANGE"));
    }

    #[test]
    fn test_settings_serialization_round_trip() {
        let settings = AntiTheftSettings {
            sim_change_detection_enabled: true,
            motion_sensitivity: 8,
            secret_code: "LOCKDOWN".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: AntiTheftSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, back);

        let password = PasswordSettings {
            password_enabled: true,
            password: "hunter2".to_string(),
            failed_attempts: 2,
            last_failed_timestamp: 1_700_000_000_000,
            ..Default::default()
        };
        let json = serde_json::to_string(&password).unwrap();
        let back: PasswordSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(password, back);
    }
}
