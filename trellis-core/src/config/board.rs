//! Board wiring configuration
//!
//! Describes which devices a board carries and at which addresses. Distinct
//! devices sharing a bus must be given distinct addresses by the board
//! wiring; this layer only records what the wiring is.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::units::power::CalibrationProfile;
use crate::units::timing::{ServoTiming, TimingError, REFERENCE_CLOCK_HZ, SERVO_FREQUENCY_HZ};

/// Default INA219 address (A0 = A1 = GND)
pub const POWER_MONITOR_DEFAULT_ADDRESS: u8 = 0x40;

/// Default PCA9685 address (A0..A5 = GND)
pub const SERVO_DEFAULT_ADDRESS: u8 = 0x40;

/// Highest 7-bit I2C address
pub const MAX_ADDRESS: u8 = 0x7F;

/// Power monitor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PowerMonitorConfig {
    /// 7-bit I2C address
    pub address: u8,
    /// Calibration written at configure time
    pub profile: CalibrationProfile,
}

impl Default for PowerMonitorConfig {
    fn default() -> Self {
        Self {
            address: POWER_MONITOR_DEFAULT_ADDRESS,
            profile: CalibrationProfile::default(),
        }
    }
}

/// PWM/servo controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServoConfig {
    /// 7-bit I2C address
    pub address: u8,
    /// Reference clock in Hz (internal oscillator unless EXTCLK is wired)
    pub reference_clock_hz: u32,
    /// PWM frequency in Hz
    pub frequency_hz: u32,
}

impl ServoConfig {
    /// Derive and validate the PWM timing for this controller
    pub fn timing(&self) -> Result<ServoTiming, TimingError> {
        ServoTiming::new(self.reference_clock_hz, self.frequency_hz)
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            address: SERVO_DEFAULT_ADDRESS,
            reference_clock_hz: REFERENCE_CLOCK_HZ,
            frequency_hz: SERVO_FREQUENCY_HZ,
        }
    }
}

/// Devices present on a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoardConfig {
    /// INA219 power monitor, if fitted
    pub power_monitor: Option<PowerMonitorConfig>,
    /// PCA9685 servo controller, if fitted
    pub servo: Option<ServoConfig>,
}

impl BoardConfig {
    /// Create an empty board configuration
    pub const fn new() -> Self {
        Self {
            power_monitor: None,
            servo: None,
        }
    }
}
