use std::sync::Arc;

use crate::enums::SecurityEventType;
use crate::models::SecurityEvent;
use crate::store::{EventStore, UserStore};

/// Fake-shutdown disguise surface: the toggle plus event bookkeeping
/// for when the disguise engages and drops.
pub struct FakeShutdownService {
    users: Arc<UserStore>,
    events: Arc<EventStore>,
}

impl FakeShutdownService {
    pub fn new(users: Arc<UserStore>, events: Arc<EventStore>) -> Self {
        Self { users, events }
    }

    pub async fn enable(&self) -> bool {
        let mut settings = self.users.get_security_settings().await;
        settings.fake_shutdown_enabled = true;
        self.users.update_security_settings(settings).await
    }

    pub async fn disable(&self) -> bool {
        let mut settings = self.users.get_security_settings().await;
        settings.fake_shutdown_enabled = false;
        self.users.update_security_settings(settings).await
    }

    pub async fn is_enabled(&self) -> bool {
        self.users.get_security_settings().await.fake_shutdown_enabled
    }

    /// Called when the disguise engages (device appears off).
    pub async fn record_activated(&self) -> bool {
        if !self.is_enabled().await {
            return false;
        }
        self.events
            .log_security_event(SecurityEvent::new(
                SecurityEventType::FakeShutdownActivated,
                "Fake shutdown disguise activated",
            ))
            .await
    }

    /// Called when the disguise drops.
    pub async fn record_deactivated(&self) -> bool {
        self.events
            .log_security_event(SecurityEvent::new(
                SecurityEventType::FakeShutdownDeactivated,
                "Fake shutdown disguise deactivated",
            ))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryKvStore;

    #[tokio::test]
    async fn test_activation_requires_enabled_flag() {
        let kv = Arc::new(MemoryKvStore::new());
        let users = Arc::new(UserStore::new(kv.clone()).await);
        let events = Arc::new(EventStore::new(kv).await);
        let service = FakeShutdownService::new(users, events.clone());

        assert!(!service.record_activated().await);
        assert!(service.enable().await);
        assert!(service.record_activated().await);
        assert!(service.record_deactivated().await);

        let logged = events.get_all_security_events().await;
        assert_eq!(logged.len(), 2);
        assert_eq!(logged[0].event_type, SecurityEventType::FakeShutdownActivated);
        assert_eq!(logged[1].event_type, SecurityEventType::FakeShutdownDeactivated);
    }
}
