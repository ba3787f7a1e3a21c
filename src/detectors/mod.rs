pub mod motion;
pub mod password;
pub mod remote;
pub mod sim;

pub use motion::MotionDetector;
pub use password::{PasswordPolicy, VerifyOutcome};
pub use remote::RemoteCommandMatcher;
pub use sim::{SimChange, SimChangeDetector};
