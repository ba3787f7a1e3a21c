use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex};
use tracing::warn;
use uuid::Uuid;

use crate::models::{AntiTheftSettings, EmergencyContact, PasswordSettings, SecuritySettings, User};

use super::{KvStore, GROUP_SECURE_PREFS, GROUP_USER_PREFS};

const KEY_USER_PROFILE: &str = "user_profile";
const KEY_EMERGENCY_CONTACTS: &str = "emergency_contacts";
const KEY_SECURITY_SETTINGS: &str = "security_settings";
const KEY_ANTI_THEFT_SETTINGS: &str = "anti_theft_settings";
const KEY_PASSWORD_SETTINGS: &str = "password_settings";

/// The identity fields persisted on their own; contacts and settings
/// live under separate keys and are composed into [`User`] on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProfileRecord {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
}

/// Durable store for the user profile, emergency contacts and every
/// settings aggregate. Writes return a success boolean and never
/// propagate storage errors; reads fall back to documented defaults.
/// The watch channels replay the latest snapshot to new subscribers and
/// are updated only after a successful write. Contacts live in their
/// own channel so they persist and replay even before a profile has
/// been saved.
pub struct UserStore {
    kv: Arc<dyn KvStore>,
    write_guard: Mutex<()>,
    user_tx: watch::Sender<Option<User>>,
    contacts_tx: watch::Sender<Vec<EmergencyContact>>,
    security_tx: watch::Sender<SecuritySettings>,
    anti_theft_tx: watch::Sender<AntiTheftSettings>,
    password_tx: watch::Sender<PasswordSettings>,
}

impl UserStore {
    pub async fn new(kv: Arc<dyn KvStore>) -> Self {
        let security: SecuritySettings = Self::load(&*kv, GROUP_USER_PREFS, KEY_SECURITY_SETTINGS)
            .await
            .unwrap_or_default();
        let contacts: Vec<EmergencyContact> =
            Self::load(&*kv, GROUP_USER_PREFS, KEY_EMERGENCY_CONTACTS)
                .await
                .unwrap_or_default();
        let profile: Option<ProfileRecord> =
            Self::load(&*kv, GROUP_USER_PREFS, KEY_USER_PROFILE).await;
        let anti_theft = Self::load(&*kv, GROUP_SECURE_PREFS, KEY_ANTI_THEFT_SETTINGS)
            .await
            .unwrap_or_default();
        let password = Self::load(&*kv, GROUP_SECURE_PREFS, KEY_PASSWORD_SETTINGS)
            .await
            .unwrap_or_default();

        let user = profile.map(|p| User {
            id: p.id,
            name: p.name,
            email: p.email,
            phone: p.phone,
            emergency_contacts: contacts.clone(),
            security_settings: security.clone(),
        });

        Self {
            kv,
            write_guard: Mutex::new(()),
            user_tx: watch::Sender::new(user),
            contacts_tx: watch::Sender::new(contacts),
            security_tx: watch::Sender::new(security),
            anti_theft_tx: watch::Sender::new(anti_theft),
            password_tx: watch::Sender::new(password),
        }
    }

    async fn load<T: serde::de::DeserializeOwned>(
        kv: &dyn KvStore,
        group: &str,
        key: &str,
    ) -> Option<T> {
        match kv.get(group, key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Ignoring malformed {}/{}: {}", group, key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read {}/{}: {}", group, key, e);
                None
            }
        }
    }

    async fn persist<T: Serialize>(&self, group: &str, key: &str, value: &T) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize {}/{}: {}", group, key, e);
                return false;
            }
        };
        match self.kv.put(group, key, json).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to write {}/{}: {}", group, key, e);
                false
            }
        }
    }

    // ─── User profile ────────────────────────────────────────────────

    pub async fn get_current_user(&self) -> Option<User> {
        self.user_tx.borrow().clone()
    }

    pub fn user_updates(&self) -> watch::Receiver<Option<User>> {
        self.user_tx.subscribe()
    }

    /// Saves the whole user aggregate: profile fields, contacts and
    /// security settings each under their own key.
    pub async fn save_user(&self, user: User) -> bool {
        let _guard = self.write_guard.lock().await;
        let profile = ProfileRecord {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        };
        let ok = self.persist(GROUP_USER_PREFS, KEY_USER_PROFILE, &profile).await
            && self
                .persist(GROUP_USER_PREFS, KEY_EMERGENCY_CONTACTS, &user.emergency_contacts)
                .await
            && self
                .persist(GROUP_USER_PREFS, KEY_SECURITY_SETTINGS, &user.security_settings)
                .await;
        if ok {
            self.security_tx.send_replace(user.security_settings.clone());
            self.contacts_tx.send_replace(user.emergency_contacts.clone());
            self.user_tx.send_replace(Some(user));
        }
        ok
    }

    // ─── Security settings ───────────────────────────────────────────

    pub async fn get_security_settings(&self) -> SecuritySettings {
        self.security_tx.borrow().clone()
    }

    pub fn security_settings_updates(&self) -> watch::Receiver<SecuritySettings> {
        self.security_tx.subscribe()
    }

    pub async fn update_security_settings(&self, settings: SecuritySettings) -> bool {
        let _guard = self.write_guard.lock().await;
        let ok = self
            .persist(GROUP_USER_PREFS, KEY_SECURITY_SETTINGS, &settings)
            .await;
        if ok {
            self.security_tx.send_replace(settings.clone());
            self.user_tx.send_if_modified(|user| {
                if let Some(user) = user {
                    user.security_settings = settings;
                    true
                } else {
                    false
                }
            });
        }
        ok
    }

    // ─── Emergency contacts ──────────────────────────────────────────

    pub async fn get_emergency_contacts(&self) -> Vec<EmergencyContact> {
        self.contacts_tx.borrow().clone()
    }

    pub fn emergency_contact_updates(&self) -> watch::Receiver<Vec<EmergencyContact>> {
        self.contacts_tx.subscribe()
    }

    pub async fn add_emergency_contact(&self, contact: EmergencyContact) -> bool {
        self.mutate_contacts(|contacts| {
            contacts.push(contact);
            true
        })
        .await
    }

    pub async fn update_emergency_contact(&self, contact: EmergencyContact) -> bool {
        self.mutate_contacts(|contacts| {
            if let Some(existing) = contacts.iter_mut().find(|c| c.id == contact.id) {
                *existing = contact;
                true
            } else {
                false
            }
        })
        .await
    }

    pub async fn delete_emergency_contact(&self, contact_id: Uuid) -> bool {
        self.mutate_contacts(|contacts| {
            let before = contacts.len();
            contacts.retain(|c| c.id != contact_id);
            contacts.len() != before
        })
        .await
    }

    /// Copy-modify-write-back over the whole contact list. The user
    /// snapshot is kept in step when a profile exists.
    async fn mutate_contacts<F>(&self, mutate: F) -> bool
    where
        F: FnOnce(&mut Vec<EmergencyContact>) -> bool,
    {
        let _guard = self.write_guard.lock().await;
        let mut contacts = self.contacts_tx.borrow().clone();
        if !mutate(&mut contacts) {
            return false;
        }
        let ok = self
            .persist(GROUP_USER_PREFS, KEY_EMERGENCY_CONTACTS, &contacts)
            .await;
        if ok {
            self.contacts_tx.send_replace(contacts.clone());
            self.user_tx.send_if_modified(|user| {
                if let Some(user) = user {
                    user.emergency_contacts = contacts;
                    true
                } else {
                    false
                }
            });
        }
        ok
    }

    // ─── Anti-theft settings ─────────────────────────────────────────

    pub async fn get_anti_theft_settings(&self) -> AntiTheftSettings {
        self.anti_theft_tx.borrow().clone()
    }

    pub fn anti_theft_settings_updates(&self) -> watch::Receiver<AntiTheftSettings> {
        self.anti_theft_tx.subscribe()
    }

    /// Rejects a configuration enabling remote lock without a secret
    /// code; the invariant is enforced here, at the edit boundary.
    pub async fn save_anti_theft_settings(&self, settings: AntiTheftSettings) -> bool {
        if settings.remote_lock_enabled && settings.secret_code.trim().is_empty() {
            warn!("Rejected anti-theft settings: remote lock enabled without a secret code");
            return false;
        }
        let _guard = self.write_guard.lock().await;
        let ok = self
            .persist(GROUP_SECURE_PREFS, KEY_ANTI_THEFT_SETTINGS, &settings)
            .await;
        if ok {
            self.anti_theft_tx.send_replace(settings);
        }
        ok
    }

    // ─── Password settings ───────────────────────────────────────────

    pub async fn get_password_settings(&self) -> PasswordSettings {
        self.password_tx.borrow().clone()
    }

    pub fn password_settings_updates(&self) -> watch::Receiver<PasswordSettings> {
        self.password_tx.subscribe()
    }

    pub async fn save_password_settings(&self, settings: PasswordSettings) -> bool {
        let _guard = self.write_guard.lock().await;
        let ok = self
            .persist(GROUP_SECURE_PREFS, KEY_PASSWORD_SETTINGS, &settings)
            .await;
        if ok {
            self.password_tx.send_replace(settings);
        }
        ok
    }

    /// Increments the failed-attempt counter and stamps the failure
    /// time. Returns the updated count (unchanged on write failure).
    pub async fn record_failed_attempt(&self, now_millis: i64) -> u32 {
        let mut settings = self.get_password_settings().await;
        settings.failed_attempts += 1;
        settings.last_failed_timestamp = now_millis;
        let count = settings.failed_attempts;
        if self.save_password_settings(settings).await {
            count
        } else {
            count - 1
        }
    }

    pub async fn reset_failed_attempts(&self) -> bool {
        let mut settings = self.get_password_settings().await;
        settings.failed_attempts = 0;
        settings.last_failed_timestamp = 0;
        self.save_password_settings(settings).await
    }
}
