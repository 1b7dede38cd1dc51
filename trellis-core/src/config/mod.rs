//! Configuration types
//!
//! Board wiring (which devices are fitted, at which addresses, with which
//! calibration and PWM timing) plus a small text format to load it from.

pub mod board;
pub mod parse;

pub use board::*;
pub use parse::{parse_board_config, ParseError};
