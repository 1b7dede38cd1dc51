//! Register-level device drivers
//!
//! This crate provides concrete implementations of the traits defined
//! in trellis-core for the devices on a Trellis board:
//!
//! - INA219 bus voltage / current / power monitor
//! - PCA9685 16-channel PWM/servo controller
//!
//! Drivers are generic over [`trellis_hal::RegisterBus`] and hold the bus
//! by value. To put several drivers on one physical bus, hand each of them
//! a [`trellis_hal::HalI2c`] over its own [`trellis_hal::RefCellDevice`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod error;
pub mod ina219;
pub mod pca9685;

#[cfg(test)]
mod testing;

pub use error::Error;
pub use ina219::Ina219;
pub use pca9685::Pca9685;
