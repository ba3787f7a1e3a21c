pub mod config;
pub mod detectors;
pub mod enums;
pub mod error;
pub mod models;
pub mod monitor;
pub mod providers;
pub mod services;
pub mod store;

pub use config::Config;
pub use enums::{IntruderTrigger, SamplingRate, SecurityEventType};
pub use error::{AppError, Result};
pub use monitor::{AntiTheftMonitor, MonitorState};
