use std::sync::Arc;

use crate::models::EmergencyContact;
use crate::store::UserStore;

use super::Responder;

/// Outer-layer surface for the SIM change capability: the enable flag
/// lives in [`SecuritySettings`], the response chain in [`Responder`].
///
/// [`SecuritySettings`]: crate::models::SecuritySettings
pub struct SimChangeService {
    users: Arc<UserStore>,
    responder: Arc<Responder>,
}

impl SimChangeService {
    pub fn new(users: Arc<UserStore>, responder: Arc<Responder>) -> Self {
        Self { users, responder }
    }

    pub async fn enable(&self) -> bool {
        let mut settings = self.users.get_security_settings().await;
        settings.sim_change_alert_enabled = true;
        self.users.update_security_settings(settings).await
    }

    pub async fn disable(&self) -> bool {
        let mut settings = self.users.get_security_settings().await;
        settings.sim_change_alert_enabled = false;
        self.users.update_security_settings(settings).await
    }

    pub async fn is_enabled(&self) -> bool {
        self.users.get_security_settings().await.sim_change_alert_enabled
    }

    /// Runs the full SIM-change response chain for an already-detected
    /// change. Returns whether the security event was logged.
    pub async fn handle_sim_change(&self, previous: Option<&str>, current: &str) -> bool {
        self.responder.handle_sim_change(previous, current).await
    }

    pub async fn contacts_to_notify(&self) -> Vec<EmergencyContact> {
        self.users
            .get_emergency_contacts()
            .await
            .into_iter()
            .filter(|c| c.notify_on_sim_change)
            .collect()
    }
}
