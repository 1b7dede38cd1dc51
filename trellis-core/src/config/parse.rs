//! Board configuration text format
//!
//! A minimal parser for the TOML subset used to describe board wiring. It
//! does NOT support full TOML syntax and needs no allocator.
//!
//! Supported features:
//! - `[power_monitor]` and `[servo]` section headers (`[ina219]` and
//!   `[pca9685]` are accepted as aliases), each at most once
//! - Key = value pairs (string, integer)
//! - Integers in decimal, `0x` hex or `0b` binary, with `_` separators
//! - Comments (# ...)
//!
//! ```toml
//! [power_monitor]
//! address = 0x40
//! profile = "16V_400mA"
//!
//! [servo]
//! address = 0x41
//! frequency_hz = 50
//! ```
//!
//! Custom calibration is written as individual keys (`calibration`,
//! `config`, `current_divisor`, `power_multiplier`) which override the
//! profile selected so far. A later `profile` key replaces all four.

use core::num::NonZeroU16;

use heapless::String as HString;

use super::board::{BoardConfig, PowerMonitorConfig, ServoConfig, MAX_ADDRESS};
use crate::units::power::CalibrationPreset;
use crate::units::timing::TimingError;

/// Longest integer literal accepted (after removing separators)
const MAX_INT_LEN: usize = 34;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid section header
    InvalidSection,
    /// Line is neither a section header nor `key = value`
    MalformedLine,
    /// Key not valid in the current section
    UnknownKey,
    /// Invalid value type or out of range
    InvalidValue,
    /// Address is not a 7-bit I2C address
    InvalidAddress,
    /// Calibration preset name not recognized
    UnknownProfile,
    /// Servo frequency cannot be produced from the reference clock
    InvalidTiming(TimingError),
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    PowerMonitor,
    Servo,
}

/// Parse board configuration text into a [`BoardConfig`]
pub fn parse_board_config(input: &str) -> Result<BoardConfig, ParseError> {
    let mut config = BoardConfig::new();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        // Skip empty lines and comments
        if line.is_empty() {
            continue;
        }

        // Check for section header
        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;

            // Each device section may appear only once
            match section {
                Section::PowerMonitor if config.power_monitor.is_none() => {
                    config.power_monitor = Some(PowerMonitorConfig::default());
                }
                Section::Servo if config.servo.is_none() => {
                    config.servo = Some(ServoConfig::default());
                }
                _ => return Err(ParseError::InvalidSection),
            }
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::MalformedLine)?;
        apply_value(section, key, value, &mut config)?;
    }

    if let Some(servo) = &config.servo {
        servo.timing().map_err(ParseError::InvalidTiming)?;
    }

    Ok(config)
}

/// Parse section header like "power_monitor" or "servo"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "power_monitor" | "ina219" => Ok(Section::PowerMonitor),
        "servo" | "pca9685" => Ok(Section::Servo),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Drop a trailing comment unless the `#` sits inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut BoardConfig,
) -> Result<(), ParseError> {
    match section {
        Section::Root => Err(ParseError::UnknownKey),
        Section::PowerMonitor => {
            let monitor = config
                .power_monitor
                .as_mut()
                .ok_or(ParseError::InvalidSection)?;
            match key {
                "address" => monitor.address = parse_address(value)?,
                "profile" => {
                    let preset = CalibrationPreset::from_name(parse_string(value)?)
                        .ok_or(ParseError::UnknownProfile)?;
                    monitor.profile = preset.profile();
                }
                "calibration" => monitor.profile.calibration = parse_int(value)?,
                "config" => monitor.profile.config = parse_int(value)?,
                "current_divisor" => monitor.profile.current_divisor_ma = parse_non_zero(value)?,
                "power_multiplier" => {
                    monitor.profile.power_multiplier_uw = parse_non_zero(value)?
                }
                _ => return Err(ParseError::UnknownKey),
            }
            Ok(())
        }
        Section::Servo => {
            let servo = config.servo.as_mut().ok_or(ParseError::InvalidSection)?;
            match key {
                "address" => servo.address = parse_address(value)?,
                "reference_clock_hz" => servo.reference_clock_hz = parse_int(value)?,
                "frequency_hz" => servo.frequency_hz = parse_int(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
            Ok(())
        }
    }
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> Result<&str, ParseError> {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        Ok(&value[1..value.len() - 1])
    } else if value.contains('"') {
        Err(ParseError::InvalidValue)
    } else {
        // Allow unquoted strings for simple values
        Ok(value)
    }
}

/// Parse an unsigned integer value
fn parse_int<T: TryFrom<u64>>(value: &str) -> Result<T, ParseError> {
    let mut digits: HString<MAX_INT_LEN> = HString::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }

    let parsed = if let Some(hex) = digits.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else if let Some(bin) = digits.strip_prefix("0b") {
        u64::from_str_radix(bin, 2)
    } else {
        digits.parse::<u64>()
    };

    let parsed = parsed.map_err(|_| ParseError::InvalidValue)?;
    T::try_from(parsed).map_err(|_| ParseError::InvalidValue)
}

fn parse_non_zero(value: &str) -> Result<NonZeroU16, ParseError> {
    NonZeroU16::new(parse_int(value)?).ok_or(ParseError::InvalidValue)
}

/// Parse a 7-bit I2C address
fn parse_address(value: &str) -> Result<u8, ParseError> {
    let address: u32 = parse_int(value)?;
    if address > MAX_ADDRESS as u32 {
        return Err(ParseError::InvalidAddress);
    }
    Ok(address as u8)
}
