#[cfg(any(test, feature = "test-util"))]
pub mod manual;
pub mod timer;

#[cfg(any(test, feature = "test-util"))]
pub use manual::ManualTimer;
pub use timer::{FrameStats, HighPrecisionTimer, Timer};
