use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ─── SecurityEventType ───────────────────────────────────────────────

/// Kinds of security events the core can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityEventType {
    SimChange,
    WrongPasswordAttempt,
    IntruderDetected,
    DeviceUnlocked,
    PanicButtonPressed,
    DeviceLocationChanged,
    DevicePoweredOff,
    DevicePoweredOn,
    FakeShutdownActivated,
    FakeShutdownDeactivated,
}

impl SecurityEventType {
    /// Canonical string stored on disk.
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityEventType::SimChange => "SIM_CHANGE",
            SecurityEventType::WrongPasswordAttempt => "WRONG_PASSWORD_ATTEMPT",
            SecurityEventType::IntruderDetected => "INTRUDER_DETECTED",
            SecurityEventType::DeviceUnlocked => "DEVICE_UNLOCKED",
            SecurityEventType::PanicButtonPressed => "PANIC_BUTTON_PRESSED",
            SecurityEventType::DeviceLocationChanged => "DEVICE_LOCATION_CHANGED",
            SecurityEventType::DevicePoweredOff => "DEVICE_POWERED_OFF",
            SecurityEventType::DevicePoweredOn => "DEVICE_POWERED_ON",
            SecurityEventType::FakeShutdownActivated => "FAKE_SHUTDOWN_ACTIVATED",
            SecurityEventType::FakeShutdownDeactivated => "FAKE_SHUTDOWN_DEACTIVATED",
        }
    }
}

impl fmt::Display for SecurityEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SecurityEventType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SIM_CHANGE" => Ok(SecurityEventType::SimChange),
            "WRONG_PASSWORD_ATTEMPT" => Ok(SecurityEventType::WrongPasswordAttempt),
            "INTRUDER_DETECTED" => Ok(SecurityEventType::IntruderDetected),
            "DEVICE_UNLOCKED" => Ok(SecurityEventType::DeviceUnlocked),
            "PANIC_BUTTON_PRESSED" => Ok(SecurityEventType::PanicButtonPressed),
            "DEVICE_LOCATION_CHANGED" => Ok(SecurityEventType::DeviceLocationChanged),
            "DEVICE_POWERED_OFF" => Ok(SecurityEventType::DevicePoweredOff),
            "DEVICE_POWERED_ON" => Ok(SecurityEventType::DevicePoweredOn),
            "FAKE_SHUTDOWN_ACTIVATED" => Ok(SecurityEventType::FakeShutdownActivated),
            "FAKE_SHUTDOWN_DEACTIVATED" => Ok(SecurityEventType::FakeShutdownDeactivated),
            _ => Err(AppError::InvalidInput(format!("Unknown event type: {}", s))),
        }
    }
}

// ─── IntruderTrigger ─────────────────────────────────────────────────

/// What tripped the intruder-detection pathway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntruderTrigger {
    WrongPassword,
    UnauthorizedMovement,
    SimChange,
    DeviceUnlocked,
}

impl IntruderTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntruderTrigger::WrongPassword => "WRONG_PASSWORD",
            IntruderTrigger::UnauthorizedMovement => "UNAUTHORIZED_MOVEMENT",
            IntruderTrigger::SimChange => "SIM_CHANGE",
            IntruderTrigger::DeviceUnlocked => "DEVICE_UNLOCKED",
        }
    }
}

impl fmt::Display for IntruderTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─── SamplingRate ────────────────────────────────────────────────────

/// Accelerometer sampling rate requested from the platform sensor hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SamplingRate {
    Low,
    Medium,
    High,
}

impl SamplingRate {
    /// Map a motion sensitivity (1-10) to a sampling rate. Monotonic:
    /// higher sensitivity never lowers the rate.
    pub fn from_sensitivity(sensitivity: u8) -> Self {
        match sensitivity {
            0..=3 => SamplingRate::Low,
            4..=7 => SamplingRate::Medium,
            _ => SamplingRate::High,
        }
    }
}

impl fmt::Display for SamplingRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SamplingRate::Low => "low",
            SamplingRate::Medium => "medium",
            SamplingRate::High => "high",
        };
        write!(f, "{}", s)
    }
}
