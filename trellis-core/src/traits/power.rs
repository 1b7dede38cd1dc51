//! Power monitor traits

/// Configuration state of a power monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMonitorState {
    /// Constructed; nothing written to the device yet
    #[default]
    Unconfigured,
    /// Configuration and calibration registers written
    Configured,
}

/// Trait for bus voltage / current / power monitors
///
/// Readings are best-effort: a failed bus transaction yields `0` and is
/// reported on the driver's diagnostic channel instead of being returned.
/// Drivers that need failures surfaced offer fallible variants of their own.
///
/// Takes `&mut self` because every reading is a bus transaction.
pub trait PowerMonitor {
    /// Bus voltage in millivolts
    fn bus_voltage_mv(&mut self) -> i16;

    /// Shunt voltage in microvolts
    fn shunt_voltage_uv(&mut self) -> i32;

    /// Current in microamps (signed; negative when current flows backwards)
    fn current_ua(&mut self) -> i32;

    /// Power in microwatts
    fn power_uw(&mut self) -> i32;

    /// Current configuration state
    fn state(&self) -> PowerMonitorState;

    /// Check if readings can be trusted (calibration written)
    fn is_configured(&self) -> bool {
        self.state() == PowerMonitorState::Configured
    }
}
