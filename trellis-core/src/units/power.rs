//! INA219 register conversions
//!
//! The INA219 reports bus voltage, shunt voltage, current and power as 16-bit
//! registers. Current and power are only meaningful once the calibration
//! register has been written; the scale factors that turn them into physical
//! units live in a [`CalibrationProfile`].

use core::num::NonZeroU16;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of status/alignment bits packed below the bus voltage value
///
/// Bit 0 is OVF, bit 1 is CNVR, bit 2 is unused.
pub const BUS_VOLTAGE_STATUS_BITS: u32 = 3;

/// Bus voltage LSB after the status bits are shifted out (mV)
pub const BUS_VOLTAGE_LSB_MV: i16 = 4;

/// Shunt voltage LSB (µV)
pub const SHUNT_VOLTAGE_LSB_UV: i32 = 10;

/// Current register values are divided into milliamps; this scales to µA
pub const MICROAMPS_PER_MILLIAMP: i32 = 1000;

/// Decode the BUS_VOLTAGE register into millivolts
///
/// The register is treated as signed and shifted arithmetically, matching
/// the device's 13-bit value left-aligned above the status bits.
pub const fn bus_voltage_mv(raw: u16) -> i16 {
    ((raw as i16) >> BUS_VOLTAGE_STATUS_BITS) * BUS_VOLTAGE_LSB_MV
}

/// Decode the SHUNT_VOLTAGE register into microvolts
pub const fn shunt_voltage_uv(raw: u16) -> i32 {
    (raw as i16) as i32 * SHUNT_VOLTAGE_LSB_UV
}

/// Decode the CURRENT register into microamps
///
/// Division truncates toward zero, so small negative currents round up.
pub const fn current_ua(raw: u16, current_divisor_ma: NonZeroU16) -> i32 {
    (raw as i16) as i32 * MICROAMPS_PER_MILLIAMP / current_divisor_ma.get() as i32
}

/// Decode the POWER register into microwatts
///
/// The register is unsigned. Saturates instead of wrapping for multipliers
/// far outside the presets.
pub const fn power_uw(raw: u16, power_multiplier_uw: NonZeroU16) -> i32 {
    (raw as i32).saturating_mul(power_multiplier_uw.get() as i32)
}

const fn non_zero(value: u16) -> NonZeroU16 {
    match NonZeroU16::new(value) {
        Some(v) => v,
        None => panic!("calibration scale factors must be non-zero"),
    }
}

/// Scaling constants for one INA219 measurement range
///
/// `config` is written to CONFIG before `calibration` is written to
/// CALIBRATION; the divisor and multiplier then map the CURRENT and POWER
/// registers to physical units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationProfile {
    /// CALIBRATION register value
    pub calibration: u16,
    /// CONFIG register value (range, gain, ADC resolution, mode)
    pub config: u16,
    /// CURRENT register counts per milliamp
    pub current_divisor_ma: NonZeroU16,
    /// Microwatts per POWER register count
    pub power_multiplier_uw: NonZeroU16,
}

impl CalibrationProfile {
    /// 32V bus range, 2A max current (±320mV shunt range)
    pub const V32_2A: Self = Self {
        calibration: 4096,
        config: 0x399F,
        current_divisor_ma: non_zero(10),
        power_multiplier_uw: non_zero(2000),
    };

    /// 32V bus range, 1A max current (±320mV shunt range)
    pub const V32_1A: Self = Self {
        calibration: 10240,
        config: 0x399F,
        current_divisor_ma: non_zero(25),
        power_multiplier_uw: non_zero(800),
    };

    /// 16V bus range, 400mA max current (±40mV shunt range, best precision)
    pub const V16_400MA: Self = Self {
        calibration: 8192,
        config: 0x019F,
        current_divisor_ma: non_zero(20),
        power_multiplier_uw: non_zero(1000),
    };

    /// Build a custom profile
    ///
    /// Returns `None` if the divisor or multiplier is zero.
    pub const fn new(
        calibration: u16,
        config: u16,
        current_divisor_ma: u16,
        power_multiplier_uw: u16,
    ) -> Option<Self> {
        match (
            NonZeroU16::new(current_divisor_ma),
            NonZeroU16::new(power_multiplier_uw),
        ) {
            (Some(current_divisor_ma), Some(power_multiplier_uw)) => Some(Self {
                calibration,
                config,
                current_divisor_ma,
                power_multiplier_uw,
            }),
            _ => None,
        }
    }

    /// Decode a CURRENT register value with this profile
    pub const fn current_ua(&self, raw: u16) -> i32 {
        current_ua(raw, self.current_divisor_ma)
    }

    /// Decode a POWER register value with this profile
    pub const fn power_uw(&self, raw: u16) -> i32 {
        power_uw(raw, self.power_multiplier_uw)
    }
}

impl Default for CalibrationProfile {
    fn default() -> Self {
        Self::V32_2A
    }
}

/// Named calibration presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CalibrationPreset {
    /// 32V / 2A
    #[default]
    V32A2,
    /// 32V / 1A
    V32A1,
    /// 16V / 400mA, best precision
    V16mA400,
}

impl CalibrationPreset {
    /// Get the profile for this preset
    pub const fn profile(self) -> CalibrationProfile {
        match self {
            CalibrationPreset::V32A2 => CalibrationProfile::V32_2A,
            CalibrationPreset::V32A1 => CalibrationProfile::V32_1A,
            CalibrationPreset::V16mA400 => CalibrationProfile::V16_400MA,
        }
    }

    /// Name used in board configuration files
    pub const fn name(self) -> &'static str {
        match self {
            CalibrationPreset::V32A2 => "32V_2A",
            CalibrationPreset::V32A1 => "32V_1A",
            CalibrationPreset::V16mA400 => "16V_400mA",
        }
    }

    /// Look up a preset by its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        [
            CalibrationPreset::V32A2,
            CalibrationPreset::V32A1,
            CalibrationPreset::V16mA400,
        ]
        .into_iter()
        .find(|preset| preset.name() == name)
    }
}

impl From<CalibrationPreset> for CalibrationProfile {
    fn from(preset: CalibrationPreset) -> Self {
        preset.profile()
    }
}
