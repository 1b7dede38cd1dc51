//! INA219 high-side power monitor (I2C)
//!
//! The INA219 measures the voltage across a shunt resistor and the bus
//! voltage behind it, and derives current and power from them once its
//! calibration register is written.
//!
//! # Register access
//!
//! All registers are 16 bits wide and big-endian on the wire. Construction
//! touches no hardware; `configure()` writes CONFIG and then CALIBRATION.
//!
//! # Failure policy
//!
//! The plain accessors are best-effort: a failed transaction yields a
//! reading of `0`, bumps [`Ina219::bus_faults`] and logs a warning (with the
//! `defmt` feature). Each accessor has a strict `try_*` twin that returns
//! the failure instead.
//!
//! ```ignore
//! let mut monitor = Ina219::new(bus);
//! monitor.configure(Some(CalibrationPreset::V16mA400.profile()));
//!
//! let mv = monitor.bus_voltage_mv();
//! let ua = monitor.try_current_ua()?;
//! ```

use trellis_core::config::{PowerMonitorConfig, POWER_MONITOR_DEFAULT_ADDRESS};
use trellis_core::traits::{PowerMonitor, PowerMonitorState};
use trellis_core::units::power::{self, CalibrationProfile};
use trellis_hal::RegisterBus;

use crate::error::Error;

/// INA219 register addresses
pub mod reg {
    /// Configuration (range, gain, ADC resolution, mode)
    pub const CONFIG: u8 = 0x00;
    /// Shunt voltage
    pub const SHUNT_VOLTAGE: u8 = 0x01;
    /// Bus voltage and conversion status
    pub const BUS_VOLTAGE: u8 = 0x02;
    /// Power (after calibration)
    pub const POWER: u8 = 0x03;
    /// Current (after calibration)
    pub const CURRENT: u8 = 0x04;
    /// Calibration
    pub const CALIBRATION: u8 = 0x05;
}

/// Default I2C address (A0 = A1 = GND)
pub const ADDRESS: u8 = POWER_MONITOR_DEFAULT_ADDRESS;

/// INA219 driver
pub struct Ina219<B> {
    bus: B,
    address: u8,
    profile: CalibrationProfile,
    state: PowerMonitorState,
    /// Failed transactions swallowed by the best-effort accessors
    bus_faults: u32,
}

impl<B: RegisterBus> Ina219<B> {
    /// Create a driver at the default address with the 32V/2A profile
    ///
    /// Does not touch the device.
    pub fn new(bus: B) -> Self {
        Self::new_with_address(bus, ADDRESS)
    }

    /// Create a driver at a specific 7-bit address
    pub fn new_with_address(bus: B, address: u8) -> Self {
        Self {
            bus,
            address,
            profile: CalibrationProfile::default(),
            state: PowerMonitorState::Unconfigured,
            bus_faults: 0,
        }
    }

    /// Create a driver from board configuration
    ///
    /// The configured profile is stored but not yet written.
    pub fn from_config(bus: B, config: &PowerMonitorConfig) -> Self {
        let mut monitor = Self::new_with_address(bus, config.address);
        monitor.profile = config.profile;
        monitor
    }

    /// Device address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Calibration profile used to decode readings
    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    /// Current configuration state
    pub fn state(&self) -> PowerMonitorState {
        self.state
    }

    /// Number of bus failures swallowed so far
    pub fn bus_faults(&self) -> u32 {
        self.bus_faults
    }

    /// Release the bus
    pub fn release(self) -> B {
        self.bus
    }

    /// Write configuration and calibration (best-effort)
    ///
    /// Replaces the stored profile if one is given, then writes CONFIG and
    /// CALIBRATION. Both writes are attempted even if the first fails, and
    /// the driver is marked configured either way.
    pub fn configure(&mut self, profile: Option<CalibrationProfile>) {
        if let Some(profile) = profile {
            self.profile = profile;
        }

        let writes = [
            (reg::CONFIG, self.profile.config),
            (reg::CALIBRATION, self.profile.calibration),
        ];
        for (register, value) in writes {
            if self.write_reg(register, value).is_err() {
                self.note_fault(register);
            }
        }

        self.state = PowerMonitorState::Configured;
    }

    /// Write configuration and calibration, stopping at the first failure
    ///
    /// The profile is replaced even on failure; the state only advances once
    /// both writes succeeded.
    pub fn try_configure(
        &mut self,
        profile: Option<CalibrationProfile>,
    ) -> Result<(), Error<B::Error>> {
        if let Some(profile) = profile {
            self.profile = profile;
        }

        self.write_reg(reg::CONFIG, self.profile.config)?;
        self.write_reg(reg::CALIBRATION, self.profile.calibration)?;
        self.state = PowerMonitorState::Configured;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "INA219 {=u8:#x}: calibration {=u16} written",
            self.address,
            self.profile.calibration
        );

        Ok(())
    }

    /// Bus voltage in millivolts (best-effort)
    pub fn bus_voltage_mv(&mut self) -> i16 {
        power::bus_voltage_mv(self.read_or_zero(reg::BUS_VOLTAGE))
    }

    /// Bus voltage in millivolts
    pub fn try_bus_voltage_mv(&mut self) -> Result<i16, Error<B::Error>> {
        Ok(power::bus_voltage_mv(self.read_reg(reg::BUS_VOLTAGE)?))
    }

    /// Shunt voltage in microvolts (best-effort)
    pub fn shunt_voltage_uv(&mut self) -> i32 {
        power::shunt_voltage_uv(self.read_or_zero(reg::SHUNT_VOLTAGE))
    }

    /// Shunt voltage in microvolts
    pub fn try_shunt_voltage_uv(&mut self) -> Result<i32, Error<B::Error>> {
        Ok(power::shunt_voltage_uv(self.read_reg(reg::SHUNT_VOLTAGE)?))
    }

    /// Current in microamps (best-effort)
    pub fn current_ua(&mut self) -> i32 {
        let raw = self.read_or_zero(reg::CURRENT);
        self.profile.current_ua(raw)
    }

    /// Current in microamps
    pub fn try_current_ua(&mut self) -> Result<i32, Error<B::Error>> {
        let raw = self.read_reg(reg::CURRENT)?;
        Ok(self.profile.current_ua(raw))
    }

    /// Power in microwatts (best-effort)
    pub fn power_uw(&mut self) -> i32 {
        let raw = self.read_or_zero(reg::POWER);
        self.profile.power_uw(raw)
    }

    /// Power in microwatts
    pub fn try_power_uw(&mut self) -> Result<i32, Error<B::Error>> {
        let raw = self.read_reg(reg::POWER)?;
        Ok(self.profile.power_uw(raw))
    }

    fn read_reg(&mut self, register: u8) -> Result<u16, Error<B::Error>> {
        let mut buf = [0u8; 2];
        self.bus
            .read_register(self.address, register, &mut buf)
            .map_err(Error::Transport)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn write_reg(&mut self, register: u8, value: u16) -> Result<(), Error<B::Error>> {
        self.bus
            .write_register(self.address, register, &value.to_be_bytes())
            .map_err(Error::Transport)
    }

    /// Raw register value, or 0 if the read failed
    fn read_or_zero(&mut self, register: u8) -> u16 {
        match self.read_reg(register) {
            Ok(raw) => raw,
            Err(_) => {
                self.note_fault(register);
                0
            }
        }
    }

    fn note_fault(&mut self, register: u8) {
        self.bus_faults = self.bus_faults.saturating_add(1);

        #[cfg(feature = "defmt")]
        defmt::warn!(
            "INA219 {=u8:#x}: transaction on register {=u8:#x} failed",
            self.address,
            register
        );
        #[cfg(not(feature = "defmt"))]
        let _ = register;
    }
}

impl<B: RegisterBus> PowerMonitor for Ina219<B> {
    fn bus_voltage_mv(&mut self) -> i16 {
        Ina219::bus_voltage_mv(self)
    }

    fn shunt_voltage_uv(&mut self) -> i32 {
        Ina219::shunt_voltage_uv(self)
    }

    fn current_ua(&mut self) -> i32 {
        Ina219::current_ua(self)
    }

    fn power_uw(&mut self) -> i32 {
        Ina219::power_uw(self)
    }

    fn state(&self) -> PowerMonitorState {
        self.state
    }
}
