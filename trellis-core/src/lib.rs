//! Board-agnostic core logic for the Trellis peripheral drivers
//!
//! This crate contains everything that does not touch a bus:
//!
//! - Register value conversions (INA219 voltage, current, power)
//! - Calibration profiles and their presets
//! - PWM timing math (prescale, tick length, pulse width to off-tick)
//! - Driver traits and state enums
//! - Board configuration types and their text format

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod traits;
pub mod units;
