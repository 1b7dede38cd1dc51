//! PWM/servo controller traits

/// Number of PWM channels on a controller
pub const CHANNEL_COUNT: u8 = 16;

/// Highest valid channel index
pub const MAX_CHANNEL: u8 = CHANNEL_COUNT - 1;

/// Configuration state of a PWM controller
///
/// `configure()` walks through these in order. A failed bus write leaves the
/// controller in the state of the last step that completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoState {
    /// Constructed; nothing written to the device yet
    #[default]
    Unconfigured,
    /// Reset issued, waiting for the device to settle
    Resetting,
    /// Oscillator stopped; the prescale register is writable
    AwaitingPrescale,
    /// Oscillator restarted with the new prescale; channels can be set
    Running,
}

/// Trait for multi-channel servo/PWM controllers
pub trait ServoController {
    /// Error type for controller operations
    type Error;

    /// Set a channel's pulse width in microseconds
    ///
    /// A width of `0` switches the channel fully off.
    fn set_pin(&mut self, channel: u8, micros: u16) -> Result<(), Self::Error>;

    /// Switch a channel fully off
    fn off(&mut self, channel: u8) -> Result<(), Self::Error> {
        self.set_pin(channel, 0)
    }

    /// Current configuration state
    fn state(&self) -> ServoState;

    /// Check if channels can be set
    fn is_running(&self) -> bool {
        self.state() == ServoState::Running
    }
}
