//! PCA9685 PWM timing
//!
//! The PCA9685 divides its reference clock by `prescale + 1` and counts 4096
//! ticks per PWM period. A channel goes high at its on-tick and low at its
//! off-tick; the drivers always use on-tick 0, so the off-tick is the pulse
//! width in ticks.
//!
//! ```text
//! prescale       = round(ref_hz / (4096 * frequency_hz)) - 1
//! micros_per_tick = (prescale + 1 + ref_mhz / 2) / ref_mhz
//! off_tick       = micros / micros_per_tick
//! ```
//!
//! `micros_per_tick` uses integer division with a `ref_mhz / 2` rounding
//! bias. Servo timing tables are built against exactly this rounding, so it
//! must not be replaced by a "more accurate" formula.

/// Internal oscillator frequency (Hz)
pub const REFERENCE_CLOCK_HZ: u32 = 25_000_000;

/// Standard analog servo frame rate (Hz)
pub const SERVO_FREQUENCY_HZ: u32 = 50;

/// Ticks in one PWM period (12-bit counter)
pub const TICKS_PER_PERIOD: u32 = 4096;

/// Off-tick value with the full-off flag set (bit 12 of OFF_H)
///
/// Not an arithmetic result: the device treats this as "output always low".
pub const FULL_OFF_TICK: u16 = 4096;

/// Smallest prescale value the device accepts
pub const PRESCALE_MIN: u32 = 3;

/// Largest prescale value (8-bit register)
pub const PRESCALE_MAX: u32 = 255;

/// Shortest accepted servo pulse (µs)
pub const MIN_PULSE_US: u16 = 500;

/// Longest accepted servo pulse (µs)
pub const MAX_PULSE_US: u16 = 3000;

/// Pulse width that switches a channel fully off
pub const PULSE_OFF_US: u16 = 0;

/// Prescale register value for a reference clock and target PWM frequency
///
/// Returns `None` when the frequency is zero or too high for the clock.
pub const fn prescale_for(reference_clock_hz: u32, frequency_hz: u32) -> Option<u32> {
    let divisor = match TICKS_PER_PERIOD.checked_mul(frequency_hz) {
        Some(d) if d > 0 => d as u64,
        _ => return None,
    };
    let rounded = (reference_clock_hz as u64 + divisor / 2) / divisor;
    (rounded as u32).checked_sub(1)
}

/// Length of one tick in whole microseconds for a given prescale
///
/// Returns `None` for a reference clock below 1 MHz.
pub const fn micros_per_tick(prescale: u32, reference_clock_hz: u32) -> Option<u32> {
    let mhz = reference_clock_hz / 1_000_000;
    if mhz == 0 {
        return None;
    }
    Some((prescale + 1 + mhz / 2) / mhz)
}

/// Prescale for 50 Hz servo frames on the internal oscillator (121)
pub const SERVO_PRESCALE: u8 = match prescale_for(REFERENCE_CLOCK_HZ, SERVO_FREQUENCY_HZ) {
    Some(p) if p <= PRESCALE_MAX => p as u8,
    _ => panic!("servo prescale out of range"),
};

/// Tick length at [`SERVO_PRESCALE`] (5 µs)
pub const SERVO_MICROS_PER_TICK: u16 =
    match micros_per_tick(SERVO_PRESCALE as u32, REFERENCE_CLOCK_HZ) {
        Some(t) if t > 0 => t as u16,
        _ => panic!("servo tick length out of range"),
    };

/// Errors from deriving PWM timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimingError {
    /// The frequency needs a prescale outside 3..=255
    FrequencyOutOfRange,
    /// Reference clock below 1 MHz
    ReferenceClockTooSlow,
    /// A tick is shorter than one microsecond, so pulse widths cannot be
    /// expressed in whole ticks per microsecond
    SubMicrosecondTick,
}

/// Validated PWM timing for one PCA9685
///
/// Only constructible through [`ServoTiming::new`] or the [`ServoTiming::SERVO`]
/// preset, so `micros_per_tick` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoTiming {
    reference_clock_hz: u32,
    frequency_hz: u32,
    prescale: u8,
    micros_per_tick: u16,
}

impl ServoTiming {
    /// 50 Hz frames on the 25 MHz internal oscillator
    pub const SERVO: Self = Self {
        reference_clock_hz: REFERENCE_CLOCK_HZ,
        frequency_hz: SERVO_FREQUENCY_HZ,
        prescale: SERVO_PRESCALE,
        micros_per_tick: SERVO_MICROS_PER_TICK,
    };

    /// Derive timing for a reference clock and PWM frequency
    pub fn new(reference_clock_hz: u32, frequency_hz: u32) -> Result<Self, TimingError> {
        if reference_clock_hz < 1_000_000 {
            return Err(TimingError::ReferenceClockTooSlow);
        }

        let prescale = prescale_for(reference_clock_hz, frequency_hz)
            .filter(|p| (PRESCALE_MIN..=PRESCALE_MAX).contains(p))
            .ok_or(TimingError::FrequencyOutOfRange)?;

        let micros_per_tick = micros_per_tick(prescale, reference_clock_hz)
            .ok_or(TimingError::ReferenceClockTooSlow)?;
        if micros_per_tick == 0 {
            return Err(TimingError::SubMicrosecondTick);
        }

        Ok(Self {
            reference_clock_hz,
            frequency_hz,
            prescale: prescale as u8,
            // prescale <= 255, so this is at most 256
            micros_per_tick: micros_per_tick as u16,
        })
    }

    /// Reference clock (Hz)
    pub const fn reference_clock_hz(&self) -> u32 {
        self.reference_clock_hz
    }

    /// Requested PWM frequency (Hz)
    pub const fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    /// PRESCALE register value
    pub const fn prescale(&self) -> u8 {
        self.prescale
    }

    /// Whole microseconds per tick
    pub const fn micros_per_tick(&self) -> u16 {
        self.micros_per_tick
    }

    /// Off-tick for a pulse width
    ///
    /// `0` maps to [`FULL_OFF_TICK`]. Other widths must lie in
    /// [`MIN_PULSE_US`]..=[`MAX_PULSE_US`], otherwise `None` is returned.
    pub const fn off_tick(&self, micros: u16) -> Option<u16> {
        if micros == PULSE_OFF_US {
            return Some(FULL_OFF_TICK);
        }
        if micros < MIN_PULSE_US || micros > MAX_PULSE_US {
            return None;
        }
        Some(micros / self.micros_per_tick)
    }
}

impl Default for ServoTiming {
    fn default() -> Self {
        Self::SERVO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_servo_prescale() {
        assert_eq!(prescale_for(25_000_000, 50), Some(121));
        assert_eq!(SERVO_PRESCALE, 121);
    }

    #[test]
    fn test_servo_micros_per_tick() {
        // (121 + 1 + 12) / 25 = 134 / 25 = 5
        assert_eq!(micros_per_tick(121, 25_000_000), Some(5));
        assert_eq!(SERVO_MICROS_PER_TICK, 5);
    }

    #[test]
    fn test_center_pulse() {
        assert_eq!(ServoTiming::SERVO.off_tick(1500), Some(300));
    }

    #[test]
    fn test_pulse_limits() {
        let timing = ServoTiming::default();

        assert_eq!(timing.off_tick(500), Some(100));
        assert_eq!(timing.off_tick(3000), Some(600));
        assert_eq!(timing.off_tick(499), None);
        assert_eq!(timing.off_tick(3001), None);
        assert_eq!(timing.off_tick(1), None);
    }

    #[test]
    fn test_zero_is_full_off() {
        assert_eq!(ServoTiming::SERVO.off_tick(0), Some(4096));
    }

    #[test]
    fn test_new_matches_servo_preset() {
        assert_eq!(ServoTiming::new(25_000_000, 50), Ok(ServoTiming::SERVO));
    }

    #[test]
    fn test_custom_frequency() {
        // 60 Hz: 25e6 / 245760 = 101.7 -> 102 - 1 = 101
        let timing = ServoTiming::new(25_000_000, 60).unwrap();
        assert_eq!(timing.prescale(), 101);
        // (102 + 12) / 25 = 4
        assert_eq!(timing.micros_per_tick(), 4);
        assert_eq!(timing.off_tick(1500), Some(375));
    }

    #[test]
    fn test_frequency_out_of_range() {
        assert_eq!(
            ServoTiming::new(25_000_000, 0),
            Err(TimingError::FrequencyOutOfRange)
        );
        // 20 Hz needs prescale 304
        assert_eq!(
            ServoTiming::new(25_000_000, 20),
            Err(TimingError::FrequencyOutOfRange)
        );
        // 2 kHz needs prescale 2
        assert_eq!(
            ServoTiming::new(25_000_000, 2000),
            Err(TimingError::FrequencyOutOfRange)
        );
        assert_eq!(
            ServoTiming::new(25_000_000, u32::MAX),
            Err(TimingError::FrequencyOutOfRange)
        );
    }

    #[test]
    fn test_slow_clock_rejected() {
        assert_eq!(
            ServoTiming::new(500_000, 1),
            Err(TimingError::ReferenceClockTooSlow)
        );
    }

    #[test]
    fn test_sub_microsecond_tick_rejected() {
        // 1 kHz: prescale 5, (6 + 12) / 25 = 0
        assert_eq!(
            ServoTiming::new(25_000_000, 1000),
            Err(TimingError::SubMicrosecondTick)
        );
    }

    proptest! {
        #[test]
        fn prop_off_tick_never_sets_full_off_flag(freq in 24u32..=400, micros in MIN_PULSE_US..=MAX_PULSE_US) {
            if let Ok(timing) = ServoTiming::new(REFERENCE_CLOCK_HZ, freq) {
                let tick = timing.off_tick(micros).unwrap();
                prop_assert!(tick < FULL_OFF_TICK);
                prop_assert_eq!(tick, micros / timing.micros_per_tick());
            }
        }

        #[test]
        fn prop_zero_is_full_off_for_any_timing(freq in 24u32..=400) {
            if let Ok(timing) = ServoTiming::new(REFERENCE_CLOCK_HZ, freq) {
                prop_assert_eq!(timing.off_tick(0), Some(FULL_OFF_TICK));
            }
        }
    }
}
