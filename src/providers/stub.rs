//! Log-only placeholder implementations used by the daemon binary
//! until real platform backends are wired in.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

use crate::enums::SamplingRate;
use crate::error::Result;
use crate::models::{DeviceSnapshot, LocationFix};

use super::{Camera, DeviceLock, DeviceStatus, LocationSource, Notifier, SensorHub};

pub struct StubCamera;

#[async_trait]
impl Camera for StubCamera {
    async fn capture_front_photo(&self) -> Option<String> {
        info!("No camera backend configured, skipping photo capture");
        None
    }
}

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_text(&self, phone: &str, message: &str) -> bool {
        info!(%phone, %message, "Would send SMS");
        true
    }

    async fn send_email(&self, recipient: &str, message: &str) -> bool {
        info!(%recipient, %message, "Would send email");
        true
    }
}

pub struct StubDeviceLock;

#[async_trait]
impl DeviceLock for StubDeviceLock {
    async fn is_lock_authority_granted(&self) -> bool {
        false
    }

    async fn lock_now(&self) -> bool {
        info!("No lock backend configured, device not locked");
        false
    }

    async fn request_lock_authority(&self) {
        info!("No lock backend configured, cannot request lock authority");
    }
}

pub struct StubDeviceStatus;

#[async_trait]
impl DeviceStatus for StubDeviceStatus {
    async fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            device_id: "unknown".to_string(),
            battery_level: -1,
            is_charging: false,
            network_type: "UNKNOWN".to_string(),
            sim_serial: None,
        }
    }
}

pub struct StubSensorHub;

#[async_trait]
impl SensorHub for StubSensorHub {
    async fn register_accelerometer(&self, rate: SamplingRate) -> Result<()> {
        info!(%rate, "Accelerometer registered (stub)");
        Ok(())
    }

    async fn unregister_accelerometer(&self) {
        info!("Accelerometer unregistered (stub)");
    }

    async fn register_sms_listener(&self) -> Result<()> {
        info!("SMS listener registered (stub)");
        Ok(())
    }

    async fn unregister_sms_listener(&self) {
        info!("SMS listener unregistered (stub)");
    }

    async fn current_sim_identity(&self) -> Option<String> {
        None
    }
}

/// Never produces a fix; the tracker task simply waits until stopped.
pub struct StubLocationSource;

#[async_trait]
impl LocationSource for StubLocationSource {
    async fn current_fix(&self) -> Option<LocationFix> {
        None
    }

    async fn start_updates(
        &self,
        _interval: Duration,
        _fastest: Duration,
    ) -> Result<mpsc::Receiver<LocationFix>> {
        let (tx, rx) = mpsc::channel(8);
        // Keep the channel open without emitting; dropped when the
        // subscriber goes away.
        tokio::spawn(async move {
            tx.closed().await;
        });
        Ok(rx)
    }
}
