//! Recording fakes shared by the service and monitor tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::enums::SamplingRate;
use crate::error::{AppError, Result};
use crate::models::{DeviceSnapshot, LocationFix};

use super::{Camera, DeviceLock, DeviceStatus, LocationSource, Notifier, SensorHub};

#[derive(Default)]
pub struct RecordingCamera {
    pub fail: AtomicBool,
    pub captures: AtomicU32,
}

#[async_trait]
impl Camera for RecordingCamera {
    async fn capture_front_photo(&self) -> Option<String> {
        let n = self.captures.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail.load(Ordering::SeqCst) {
            None
        } else {
            Some(format!("/data/photos/capture-{}.jpg", n))
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: AtomicBool,
    pub texts: Mutex<Vec<(String, String)>>,
    pub emails: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(&self, phone: &str, message: &str) -> bool {
        self.texts
            .lock()
            .unwrap()
            .push((phone.to_string(), message.to_string()));
        !self.fail.load(Ordering::SeqCst)
    }

    async fn send_email(&self, recipient: &str, message: &str) -> bool {
        self.emails
            .lock()
            .unwrap()
            .push((recipient.to_string(), message.to_string()));
        !self.fail.load(Ordering::SeqCst)
    }
}

pub struct RecordingLock {
    pub granted: AtomicBool,
    pub locks: AtomicU32,
}

impl Default for RecordingLock {
    fn default() -> Self {
        Self {
            granted: AtomicBool::new(true),
            locks: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl DeviceLock for RecordingLock {
    async fn is_lock_authority_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    async fn lock_now(&self) -> bool {
        if self.granted.load(Ordering::SeqCst) {
            self.locks.fetch_add(1, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    async fn request_lock_authority(&self) {}
}

pub struct StaticDeviceStatus;

#[async_trait]
impl DeviceStatus for StaticDeviceStatus {
    async fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            device_id: "test-device".to_string(),
            battery_level: 80,
            is_charging: true,
            network_type: "4G".to_string(),
            sim_serial: Some("8998-TEST".to_string()),
        }
    }
}

/// Location source driven by the test: `set_fix` controls the single
/// fix, `push` feeds active subscriptions.
#[derive(Default)]
pub struct ManualLocationSource {
    pub fix: Mutex<Option<LocationFix>>,
    pub subscriptions_started: AtomicU32,
    senders: Mutex<Vec<mpsc::Sender<LocationFix>>>,
}

impl ManualLocationSource {
    pub fn set_fix(&self, fix: Option<LocationFix>) {
        *self.fix.lock().unwrap() = fix;
    }

    pub async fn push(&self, fix: LocationFix) {
        let senders = self.senders.lock().unwrap().clone();
        for tx in senders {
            let _ = tx.send(fix.clone()).await;
        }
    }
}

#[async_trait]
impl LocationSource for ManualLocationSource {
    async fn current_fix(&self) -> Option<LocationFix> {
        self.fix.lock().unwrap().clone()
    }

    async fn start_updates(
        &self,
        _interval: Duration,
        _fastest: Duration,
    ) -> Result<mpsc::Receiver<LocationFix>> {
        let (tx, rx) = mpsc::channel(16);
        self.subscriptions_started.fetch_add(1, Ordering::SeqCst);
        self.senders.lock().unwrap().push(tx);
        Ok(rx)
    }
}

/// Sensor hub that records registrations and can be told to fail.
#[derive(Default)]
pub struct RecordingSensorHub {
    pub fail_accelerometer: AtomicBool,
    pub fail_sms: AtomicBool,
    pub accelerometer_active: AtomicBool,
    pub sms_active: AtomicBool,
    pub accelerometer_rates: Mutex<Vec<SamplingRate>>,
    pub sim_identity: Mutex<Option<String>>,
}

impl RecordingSensorHub {
    pub fn set_sim_identity(&self, id: Option<&str>) {
        *self.sim_identity.lock().unwrap() = id.map(str::to_string);
    }
}

#[async_trait]
impl SensorHub for RecordingSensorHub {
    async fn register_accelerometer(&self, rate: SamplingRate) -> Result<()> {
        if self.fail_accelerometer.load(Ordering::SeqCst) {
            return Err(AppError::SensorUnavailable("accelerometer absent".to_string()));
        }
        self.accelerometer_active.store(true, Ordering::SeqCst);
        self.accelerometer_rates.lock().unwrap().push(rate);
        Ok(())
    }

    async fn unregister_accelerometer(&self) {
        self.accelerometer_active.store(false, Ordering::SeqCst);
    }

    async fn register_sms_listener(&self) -> Result<()> {
        if self.fail_sms.load(Ordering::SeqCst) {
            return Err(AppError::SensorUnavailable("SMS receiver unavailable".to_string()));
        }
        self.sms_active.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn unregister_sms_listener(&self) {
        self.sms_active.store(false, Ordering::SeqCst);
    }

    async fn current_sim_identity(&self) -> Option<String> {
        self.sim_identity.lock().unwrap().clone()
    }
}
