use std::sync::Arc;

use crate::models::EmergencyContact;
use crate::store::UserStore;

use super::Responder;

/// Panic-button surface: the "trigger now" entry point the UI calls
/// plus the enable flag.
pub struct PanicService {
    users: Arc<UserStore>,
    responder: Arc<Responder>,
}

impl PanicService {
    pub fn new(users: Arc<UserStore>, responder: Arc<Responder>) -> Self {
        Self { users, responder }
    }

    pub async fn enable(&self) -> bool {
        let mut settings = self.users.get_security_settings().await;
        settings.panic_button_enabled = true;
        self.users.update_security_settings(settings).await
    }

    pub async fn disable(&self) -> bool {
        let mut settings = self.users.get_security_settings().await;
        settings.panic_button_enabled = false;
        self.users.update_security_settings(settings).await
    }

    pub async fn is_enabled(&self) -> bool {
        self.users.get_security_settings().await.panic_button_enabled
    }

    /// Manual activation. Returns whether the event was logged.
    pub async fn trigger(&self, audio_path: Option<String>) -> bool {
        self.responder.handle_panic(audio_path).await
    }

    pub async fn contacts_to_notify(&self) -> Vec<EmergencyContact> {
        self.users
            .get_emergency_contacts()
            .await
            .into_iter()
            .filter(|c| c.notify_on_panic)
            .collect()
    }
}
