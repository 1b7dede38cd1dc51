//! Register value conversions
//!
//! Every magic number the drivers put on the wire is derived here from a
//! documented formula, so it can be checked without a bus.

pub mod power;
pub mod timing;

pub use power::{CalibrationPreset, CalibrationProfile};
pub use timing::{ServoTiming, TimingError};
