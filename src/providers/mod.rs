use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::enums::SamplingRate;
use crate::error::Result;
use crate::models::{DeviceSnapshot, LocationFix};

pub mod stub;

#[cfg(test)]
pub(crate) mod testing;

/// Front-camera photo capture. Best-effort: `None` means no photo could
/// be taken (no camera, permission revoked, capture error).
#[async_trait]
pub trait Camera: Send + Sync {
    async fn capture_front_photo(&self) -> Option<String>;
}

/// Outbound SMS/email delivery, best-effort per recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, phone: &str, message: &str) -> bool;
    async fn send_email(&self, recipient: &str, message: &str) -> bool;
}

/// Platform device-lock authority.
#[async_trait]
pub trait DeviceLock: Send + Sync {
    async fn is_lock_authority_granted(&self) -> bool;
    async fn lock_now(&self) -> bool;
    async fn request_lock_authority(&self);
}

/// Snapshot of device state for intruder records.
#[async_trait]
pub trait DeviceStatus: Send + Sync {
    async fn snapshot(&self) -> DeviceSnapshot;
}

/// Registration surface for the platform's sensor and telephony
/// callbacks. Registration can fail (sensor absent, permission
/// revoked); the monitor treats a failed capability as disabled for
/// the session.
#[async_trait]
pub trait SensorHub: Send + Sync {
    async fn register_accelerometer(&self, rate: SamplingRate) -> Result<()>;
    async fn unregister_accelerometer(&self);
    async fn register_sms_listener(&self) -> Result<()>;
    async fn unregister_sms_listener(&self);
    /// Identity of the currently inserted SIM, if readable.
    async fn current_sim_identity(&self) -> Option<String>;
}

/// Platform location acquisition.
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Best-effort single fix: bounded wait for a fresh fix, falling
    /// back to the last known one; `None` when neither is available.
    async fn current_fix(&self) -> Option<LocationFix>;

    /// Begins continuous acquisition at roughly `interval`, never
    /// delivering faster than `fastest`. Dropping the receiver stops
    /// the underlying acquisition.
    async fn start_updates(
        &self,
        interval: Duration,
        fastest: Duration,
    ) -> Result<mpsc::Receiver<LocationFix>>;
}
