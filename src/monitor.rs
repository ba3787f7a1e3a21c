use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::detectors::{MotionDetector, RemoteCommandMatcher, SimChangeDetector};
use crate::models::AntiTheftSettings;
use crate::providers::SensorHub;
use crate::services::Responder;
use crate::store::UserStore;

/// Lifecycle of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Initializing,
    Active,
}

/// A detected condition queued for its response chain.
#[derive(Debug)]
enum Trigger {
    SimChange { previous: Option<String>, current: String },
    Motion { magnitude: f64 },
    WrongPassword,
    RemoteLock,
}

struct Inner {
    state: MonitorState,
    settings: AntiTheftSettings,
    sim: Option<SimChangeDetector>,
    motion: Option<MotionDetector>,
    remote: Option<RemoteCommandMatcher>,
    trigger_tx: Option<mpsc::Sender<Trigger>>,
    consumer: Option<JoinHandle<()>>,
}

/// The background coordinator: loads the anti-theft policy, keeps the
/// enabled detectors registered with the platform, and feeds detected
/// conditions into a single-consumer queue so each trigger's response
/// chain runs to completion before the next one starts.
pub struct AntiTheftMonitor {
    users: Arc<UserStore>,
    responder: Arc<Responder>,
    sensors: Arc<dyn SensorHub>,
    inner: Mutex<Inner>,
}

impl AntiTheftMonitor {
    pub fn new(users: Arc<UserStore>, responder: Arc<Responder>, sensors: Arc<dyn SensorHub>) -> Self {
        Self {
            users,
            responder,
            sensors,
            inner: Mutex::new(Inner {
                state: MonitorState::Stopped,
                settings: AntiTheftSettings::default(),
                sim: None,
                motion: None,
                remote: None,
                trigger_tx: None,
                consumer: None,
            }),
        }
    }

    pub async fn state(&self) -> MonitorState {
        self.inner.lock().await.state
    }

    /// Idempotent. Loads the current anti-theft settings and registers
    /// a detector per enabled capability. With nothing enabled the
    /// monitor stays stopped. A capability whose registration fails is
    /// disabled for the session; the others still activate.
    pub async fn start(&self) -> MonitorState {
        let mut inner = self.inner.lock().await;
        if inner.state == MonitorState::Active {
            return MonitorState::Active;
        }
        inner.state = MonitorState::Initializing;

        let settings = self.users.get_anti_theft_settings().await;
        if settings.all_disabled() {
            debug!("No anti-theft capability enabled, staying stopped");
            inner.state = MonitorState::Stopped;
            return MonitorState::Stopped;
        }

        self.register_capabilities(&mut inner, settings).await;

        let any_registered = inner.sim.is_some()
            || inner.motion.is_some()
            || inner.remote.is_some()
            || inner.settings.wrong_password_detection_enabled;
        if !any_registered {
            warn!("Every enabled capability failed to register, staying stopped");
            inner.state = MonitorState::Stopped;
            return MonitorState::Stopped;
        }

        let (tx, rx) = mpsc::channel(32);
        inner.trigger_tx = Some(tx);
        inner.consumer = Some(tokio::spawn(Self::consume(rx, self.responder.clone())));
        inner.state = MonitorState::Active;
        info!("Anti-theft monitor active");
        MonitorState::Active
    }

    /// Unregisters all detectors and closes the trigger queue. Safe to
    /// call repeatedly and from shutdown hooks. Response work already
    /// dispatched keeps running to completion.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        self.unregister_all(&mut inner).await;
        inner.trigger_tx = None;
        inner.consumer.take();
        if inner.state != MonitorState::Stopped {
            info!("Anti-theft monitor stopped");
        }
        inner.state = MonitorState::Stopped;
    }

    /// Re-reads the settings and re-registers only what changed. When a
    /// settings update disables everything the monitor transitions to
    /// stopped. A stopped monitor delegates to `start()` instead.
    pub async fn update_settings(&self) -> MonitorState {
        {
            let mut inner = self.inner.lock().await;
            // The lock is held across the whole diff, so a concurrent
            // stop() cannot interleave between the state check and the
            // re-registration work.
            if inner.state == MonitorState::Active {
                return self.apply_settings(&mut inner).await;
            }
        }
        self.start().await
    }

    async fn apply_settings(&self, inner: &mut Inner) -> MonitorState {
        let new = self.users.get_anti_theft_settings().await;
        if new.all_disabled() {
            self.unregister_all(&mut *inner).await;
            inner.trigger_tx = None;
            inner.consumer.take();
            inner.state = MonitorState::Stopped;
            inner.settings = new;
            info!("All capabilities disabled, monitor stopped");
            return MonitorState::Stopped;
        }

        // SIM: enabling seeds a fresh baseline, disabling clears it
        match (new.sim_change_detection_enabled, inner.sim.is_some()) {
            (true, false) => {
                let baseline = self.sensors.current_sim_identity().await;
                inner.sim = Some(SimChangeDetector::with_baseline(baseline));
            }
            (false, true) => inner.sim = None,
            _ => {}
        }

        // Motion: re-register on enable or on a sensitivity change
        match (new.motion_detection_enabled, inner.motion.as_mut()) {
            (true, None) => {
                let detector = MotionDetector::new(new.motion_sensitivity);
                match self.sensors.register_accelerometer(detector.sampling_rate()).await {
                    Ok(()) => inner.motion = Some(detector),
                    Err(e) => warn!("Motion detection unavailable: {}", e),
                }
            }
            (true, Some(detector)) => {
                if detector.sensitivity() != new.motion_sensitivity.clamp(1, 10) {
                    detector.set_sensitivity(new.motion_sensitivity);
                    let rate = detector.sampling_rate();
                    self.sensors.unregister_accelerometer().await;
                    if let Err(e) = self.sensors.register_accelerometer(rate).await {
                        warn!("Motion re-registration failed: {}", e);
                        inner.motion = None;
                    }
                }
            }
            (false, Some(_)) => {
                self.sensors.unregister_accelerometer().await;
                inner.motion = None;
            }
            (false, None) => {}
        }

        // Remote lock: keep the matcher's code current
        match (new.remote_lock_enabled, inner.remote.as_mut()) {
            (true, None) => match self.sensors.register_sms_listener().await {
                Ok(()) => inner.remote = Some(RemoteCommandMatcher::new(new.secret_code.clone())),
                Err(e) => warn!("Remote lock unavailable: {}", e),
            },
            (true, Some(matcher)) => matcher.set_secret_code(new.secret_code.clone()),
            (false, Some(_)) => {
                self.sensors.unregister_sms_listener().await;
                inner.remote = None;
            }
            (false, None) => {}
        }

        inner.settings = new;
        MonitorState::Active
    }

    async fn register_capabilities(&self, inner: &mut Inner, settings: AntiTheftSettings) {
        if settings.sim_change_detection_enabled {
            let baseline = self.sensors.current_sim_identity().await;
            inner.sim = Some(SimChangeDetector::with_baseline(baseline));
        }

        if settings.motion_detection_enabled {
            let detector = MotionDetector::new(settings.motion_sensitivity);
            match self.sensors.register_accelerometer(detector.sampling_rate()).await {
                Ok(()) => inner.motion = Some(detector),
                Err(e) => warn!("Motion detection unavailable: {}", e),
            }
        }

        if settings.remote_lock_enabled {
            match self.sensors.register_sms_listener().await {
                Ok(()) => inner.remote = Some(RemoteCommandMatcher::new(settings.secret_code.clone())),
                Err(e) => warn!("Remote lock unavailable: {}", e),
            }
        }

        inner.settings = settings;
    }

    async fn unregister_all(&self, inner: &mut Inner) {
        if inner.motion.take().is_some() {
            self.sensors.unregister_accelerometer().await;
        }
        if inner.remote.take().is_some() {
            self.sensors.unregister_sms_listener().await;
        }
        inner.sim = None;
    }

    async fn consume(mut rx: mpsc::Receiver<Trigger>, responder: Arc<Responder>) {
        while let Some(trigger) = rx.recv().await {
            match trigger {
                Trigger::SimChange { previous, current } => {
                    responder.handle_sim_change(previous.as_deref(), &current).await;
                }
                Trigger::Motion { magnitude } => {
                    responder.handle_motion(magnitude).await;
                }
                Trigger::WrongPassword => {
                    responder.handle_wrong_password().await;
                }
                Trigger::RemoteLock => {
                    responder.handle_remote_lock().await;
                }
            }
        }
        debug!("Trigger queue closed");
    }

    async fn push(&self, tx: Option<mpsc::Sender<Trigger>>, trigger: Trigger) {
        if let Some(tx) = tx {
            if tx.send(trigger).await.is_err() {
                warn!("Trigger dropped: monitor stopped while dispatching");
            }
        }
    }

    // ─── Detector callbacks ──────────────────────────────────────────

    /// Platform report of the currently inserted SIM. The first report
    /// after (re-)enabling only seeds the baseline.
    pub async fn on_sim_identity_changed(&self, identity: &str) {
        let (change, tx) = {
            let mut inner = self.inner.lock().await;
            if inner.state != MonitorState::Active {
                return;
            }
            let change = inner.sim.as_mut().and_then(|d| d.observe(identity));
            (change, inner.trigger_tx.clone())
        };
        if let Some(change) = change {
            info!(previous = %change.previous, current = %change.current, "SIM change detected");
            self.push(
                tx,
                Trigger::SimChange {
                    previous: Some(change.previous),
                    current: change.current,
                },
            )
            .await;
        }
    }

    /// Raw accelerometer sample from the platform.
    pub async fn on_motion_sample(&self, x: f64, y: f64, z: f64) {
        let (trigger, tx) = {
            let mut inner = self.inner.lock().await;
            if inner.state != MonitorState::Active {
                return;
            }
            let trigger = inner.motion.as_mut().and_then(|d| d.process_sample(x, y, z));
            (trigger, inner.trigger_tx.clone())
        };
        if let Some(trigger) = trigger {
            info!(magnitude = trigger.magnitude, "Motion threshold exceeded");
            self.push(tx, Trigger::Motion { magnitude: trigger.magnitude }).await;
        }
    }

    /// Called after a failed password verification. Emits a trigger
    /// once the stored failure counter reaches the configured limit.
    pub async fn on_wrong_password_attempt(&self) {
        let (max, tx) = {
            let inner = self.inner.lock().await;
            if inner.state != MonitorState::Active
                || !inner.settings.wrong_password_detection_enabled
            {
                return;
            }
            (inner.settings.max_password_attempts, inner.trigger_tx.clone())
        };
        let failed = self.users.get_password_settings().await.failed_attempts;
        if failed >= max {
            info!(failed, max, "Wrong password limit reached");
            self.push(tx, Trigger::WrongPassword).await;
        }
    }

    /// Incoming SMS text. Fires the remote-lock chain when the message
    /// contains the configured secret code.
    pub async fn on_remote_command_received(&self, text: &str) {
        let tx = {
            let inner = self.inner.lock().await;
            if inner.state != MonitorState::Active {
                return;
            }
            match inner.remote.as_ref() {
                Some(matcher) if matcher.matches(text) => inner.trigger_tx.clone(),
                _ => return,
            }
        };
        info!("Remote lock command matched");
        self.push(tx, Trigger::RemoteLock).await;
    }
}
