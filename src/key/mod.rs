//! Key-line side of the relay: shared key state, hardware line access,
//! and local edge detection.

pub mod line;
pub mod monitor;
pub mod state;

pub use line::{HardwareLine, SerialLine};
pub use monitor::LocalKeyMonitor;
pub use state::KeyState;
