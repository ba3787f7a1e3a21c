pub mod fake_shutdown;
pub mod intruder;
pub mod location_tracker;
pub mod location_tracking;
pub mod panic;
pub mod responder;
pub mod sim_change;

pub use fake_shutdown::FakeShutdownService;
pub use intruder::IntruderService;
pub use location_tracker::LocationTracker;
pub use location_tracking::LocationTrackingService;
pub use panic::PanicService;
pub use responder::Responder;
pub use sim_change::SimChangeService;
