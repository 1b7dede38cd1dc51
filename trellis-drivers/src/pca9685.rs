//! PCA9685 16-channel PWM/servo controller (I2C)
//!
//! Each channel has four registers (ON_L, ON_H, OFF_L, OFF_H) holding the
//! tick at which the output goes high and the tick at which it goes low.
//! This driver always uses on-tick 0, so a pulse width maps to a single
//! off-tick.
//!
//! # Configuration sequence
//!
//! The prescale register is only writable while the oscillator sleeps:
//!
//! 1. Write MODE1 = RESTART (reset), wait [`RESET_SETTLE_MS`]
//! 2. Read MODE1
//! 3. Write MODE1 = `(old & !RESTART) | SLEEP`
//! 4. Write PRESCALE
//! 5. Write MODE1 = old, wait [`OSCILLATOR_SETTLE_MS`]
//! 6. Write MODE1 = `old | RESTART | AI`
//!
//! A failure stops the sequence at once and leaves [`Pca9685::state`] at the
//! last step that completed.

use embedded_hal::delay::DelayNs;
use trellis_core::config::{ServoConfig, SERVO_DEFAULT_ADDRESS};
use trellis_core::traits::{ServoController, ServoState, MAX_CHANNEL};
use trellis_core::units::timing::{ServoTiming, TimingError};
use trellis_hal::RegisterBus;

use crate::error::Error;

/// PCA9685 register addresses
pub mod reg {
    /// Mode register 1
    pub const MODE1: u8 = 0x00;
    /// Mode register 2
    pub const MODE2: u8 = 0x01;
    /// I2C sub-address 1
    pub const SUBADR1: u8 = 0x02;
    /// I2C sub-address 2
    pub const SUBADR2: u8 = 0x03;
    /// I2C sub-address 3
    pub const SUBADR3: u8 = 0x04;
    /// All-call address
    pub const ALLCALLADR: u8 = 0x05;
    /// Channel 0 on-tick, low byte
    pub const PWM0_ON_L: u8 = 0x06;
    /// Channel 0 on-tick, high byte
    pub const PWM0_ON_H: u8 = 0x07;
    /// Channel 0 off-tick, low byte
    pub const PWM0_OFF_L: u8 = 0x08;
    /// Channel 0 off-tick, high byte (bit 4 is full-off)
    pub const PWM0_OFF_H: u8 = 0x09;
    /// Oscillator prescaler
    pub const PRESCALE: u8 = 0xFE;

    /// Registers per channel
    pub const CHANNEL_STRIDE: u8 = 4;
}

/// MODE1 bits
pub mod mode1 {
    /// Respond to the all-call address
    pub const ALLCALL: u8 = 0x01;
    /// Respond to sub-address 3
    pub const SUB3: u8 = 0x02;
    /// Respond to sub-address 2
    pub const SUB2: u8 = 0x04;
    /// Respond to sub-address 1
    pub const SUB1: u8 = 0x08;
    /// Low power mode, oscillator off
    pub const SLEEP: u8 = 0x10;
    /// Register auto-increment
    pub const AI: u8 = 0x20;
    /// Use the EXTCLK pin as reference clock
    pub const EXTCLK: u8 = 0x40;
    /// Restart (write 1 to reset or resume PWM)
    pub const RESTART: u8 = 0x80;
}

/// Default I2C address (A0..A5 = GND)
pub const ADDRESS: u8 = SERVO_DEFAULT_ADDRESS;

/// Fixed wait after the reset write (ms)
///
/// A production version should poll MODE1 until RESTART reads back clear
/// instead of sleeping.
pub const RESET_SETTLE_MS: u32 = 10;

/// Wait for the oscillator to come back after leaving sleep (ms)
///
/// The datasheet asks for 500 µs; this leaves a wide margin.
pub const OSCILLATOR_SETTLE_MS: u32 = 5;

/// First register of a channel's PWM block
///
/// `channel` must be at most [`MAX_CHANNEL`].
pub const fn channel_register(channel: u8) -> u8 {
    reg::PWM0_ON_L + reg::CHANNEL_STRIDE * channel
}

/// PWM block payload for on-tick 0 and the given off-tick
pub const fn pwm_block(off_tick: u16) -> [u8; 4] {
    let [lo, hi] = off_tick.to_le_bytes();
    [0, 0, lo, hi]
}

/// PCA9685 driver
pub struct Pca9685<B> {
    bus: B,
    address: u8,
    timing: ServoTiming,
    state: ServoState,
}

impl<B: RegisterBus> Pca9685<B> {
    /// Create a driver at the default address for 50 Hz servo frames
    ///
    /// Does not touch the device.
    pub fn new(bus: B) -> Self {
        Self::with_timing(bus, ADDRESS, ServoTiming::SERVO)
    }

    /// Create a driver at a specific 7-bit address for 50 Hz servo frames
    pub fn new_with_address(bus: B, address: u8) -> Self {
        Self::with_timing(bus, address, ServoTiming::SERVO)
    }

    /// Create a driver with custom PWM timing
    pub fn with_timing(bus: B, address: u8, timing: ServoTiming) -> Self {
        Self {
            bus,
            address,
            timing,
            state: ServoState::Unconfigured,
        }
    }

    /// Create a driver from board configuration
    pub fn from_config(bus: B, config: &ServoConfig) -> Result<Self, TimingError> {
        Ok(Self::with_timing(bus, config.address, config.timing()?))
    }

    /// Device address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// PWM timing written at configure time
    pub fn timing(&self) -> &ServoTiming {
        &self.timing
    }

    /// Current configuration state
    pub fn state(&self) -> ServoState {
        self.state
    }

    /// Release the bus
    pub fn release(self) -> B {
        self.bus
    }

    /// Reset the device and program its prescaler
    ///
    /// Can be called again from any state; the whole sequence is rerun.
    pub fn configure<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error<B::Error>> {
        self.state = ServoState::Unconfigured;

        self.write_byte(reg::MODE1, mode1::RESTART)?;
        self.state = ServoState::Resetting;
        delay.delay_ms(RESET_SETTLE_MS);

        let old_mode = self.read_byte(reg::MODE1)?;
        self.write_byte(reg::MODE1, (old_mode & !mode1::RESTART) | mode1::SLEEP)?;
        self.state = ServoState::AwaitingPrescale;

        self.write_byte(reg::PRESCALE, self.timing.prescale())?;
        self.write_byte(reg::MODE1, old_mode)?;
        delay.delay_ms(OSCILLATOR_SETTLE_MS);
        self.write_byte(reg::MODE1, old_mode | mode1::RESTART | mode1::AI)?;
        self.state = ServoState::Running;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "PCA9685 {=u8:#x}: running, prescale {=u8}",
            self.address,
            self.timing.prescale()
        );

        Ok(())
    }

    /// Set a channel's pulse width in microseconds
    ///
    /// `0` switches the channel fully off. Arguments are checked before the
    /// state, and neither check touches the bus.
    pub fn set_pin(&mut self, channel: u8, micros: u16) -> Result<(), Error<B::Error>> {
        if channel > MAX_CHANNEL {
            return Err(Error::InvalidChannel(channel));
        }
        let off_tick = self
            .timing
            .off_tick(micros)
            .ok_or(Error::InvalidPulseWidth(micros))?;
        if self.state != ServoState::Running {
            return Err(Error::NotConfigured);
        }

        self.bus
            .write_register(self.address, channel_register(channel), &pwm_block(off_tick))
            .map_err(Error::Transport)
    }

    fn read_byte(&mut self, register: u8) -> Result<u8, Error<B::Error>> {
        let mut buf = [0u8; 1];
        self.bus
            .read_register(self.address, register, &mut buf)
            .map_err(Error::Transport)?;
        Ok(buf[0])
    }

    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), Error<B::Error>> {
        self.bus
            .write_register(self.address, register, &[value])
            .map_err(Error::Transport)
    }
}

impl<B: RegisterBus> ServoController for Pca9685<B> {
    type Error = Error<B::Error>;

    fn set_pin(&mut self, channel: u8, micros: u16) -> Result<(), Self::Error> {
        Pca9685::set_pin(self, channel, micros)
    }

    fn state(&self) -> ServoState {
        self.state
    }
}
