//! Driver traits
//!
//! These traits define the interface between application code and the
//! device drivers, so a polling loop can work with any power monitor or
//! servo controller.

pub mod power;
pub mod servo;

pub use power::{PowerMonitor, PowerMonitorState};
pub use servo::{ServoController, ServoState, CHANNEL_COUNT, MAX_CHANNEL};
