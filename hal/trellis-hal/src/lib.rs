//! Trellis Hardware Abstraction Layer
//!
//! This crate defines the bus contract the Trellis peripheral drivers are
//! written against: addressed, register-indexed reads and writes of a byte
//! sequence. Chip HALs only have to provide an `embedded-hal` I2C master;
//! [`HalI2c`] turns it into a [`RegisterBus`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  trellis-drivers (INA219, PCA9685)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  trellis-hal (RegisterBus, HalI2c)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  any embedded_hal::i2c::I2c master      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Sharing a bus
//!
//! Several devices usually hang off one physical bus. Drivers never own the
//! bus: put the I2C master in a `RefCell` once and give every driver its own
//! [`RefCellDevice`] wrapped in a [`HalI2c`].
//!
//! ```ignore
//! let i2c = RefCell::new(i2c);
//! let monitor = Ina219::new(HalI2c::new(RefCellDevice::new(&i2c)));
//! let servos = Pca9685::new_with_address(HalI2c::new(RefCellDevice::new(&i2c)), 0x41);
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod i2c;

// Re-export key types at crate root for convenience
pub use i2c::{HalI2c, I2cBusError, RegisterBus};
pub use embedded_hal_bus::i2c::RefCellDevice;
