//! Conversion between raw characteristic bytes and typed mug values.
//!
//! Temperatures are little-endian `u16` values in hundredths of a degree Celsius.

use crate::device::constants::MUG_NAME_MAX_LEN;
use crate::device::types::{MugColor, TemperatureUnit};
use crate::error::MugError;

/// Highest temperature (°C) that fits the wire format.
pub const MAX_TEMPERATURE: f64 = u16::MAX as f64 / 100.0;

fn require_len(bytes: &[u8], expected: usize) -> Result<(), MugError> {
    if bytes.len() < expected {
        return Err(MugError::ShortRead { expected, actual: bytes.len() });
    }
    Ok(())
}

pub fn decode_temperature(bytes: &[u8]) -> Result<f64, MugError> {
    require_len(bytes, 2)?;
    let raw = u16::from_le_bytes([bytes[0], bytes[1]]);
    Ok(f64::from(raw) / 100.0)
}

/// Sub-hundredth precision is truncated. Negative, non-finite and too large
/// values are rejected rather than wrapped.
pub fn encode_temperature(celsius: f64) -> Result<[u8; 2], MugError> {
    let scaled = celsius * 100.0;
    if !scaled.is_finite() || celsius < 0.0 {
        return Err(MugError::TemperatureOutOfRange { value: celsius });
    }

    // 30.28 * 100.0 == 3027.9999999999995
    let nearest = scaled.round();
    let scaled = if (scaled - nearest).abs() < 1e-6 { nearest } else { scaled.trunc() };

    if scaled < 0.0 || scaled > f64::from(u16::MAX) {
        return Err(MugError::TemperatureOutOfRange { value: celsius });
    }

    Ok((scaled as u16).to_le_bytes())
}

pub fn decode_battery(bytes: &[u8]) -> Result<u8, MugError> {
    require_len(bytes, 1)?;
    Ok(bytes[0])
}

/// Cuts `name` to the first 14 bytes. This is a byte cut: a multi-byte
/// character straddling the limit is split.
pub fn truncate_to_14_bytes(name: &str) -> &[u8] {
    let bytes = name.as_bytes();
    &bytes[..bytes.len().min(MUG_NAME_MAX_LEN)]
}

pub fn encode_name(name: &str) -> Vec<u8> {
    truncate_to_14_bytes(name).to_vec()
}

pub fn decode_name(bytes: &[u8]) -> String {
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

pub fn encode_color(bytes: &[u8]) -> Result<[u8; 4], MugError> {
    MugColor::try_from(bytes).map(|color| color.0)
}

pub fn decode_color(bytes: &[u8]) -> Result<MugColor, MugError> {
    require_len(bytes, 4)?;
    MugColor::try_from(&bytes[..4])
}

pub fn encode_unit(unit: TemperatureUnit) -> [u8; 1] {
    [u8::from(unit.is_fahrenheit())]
}

pub fn decode_unit(bytes: &[u8]) -> Result<TemperatureUnit, MugError> {
    require_len(bytes, 1)?;
    Ok(if bytes[0] != 0 { TemperatureUnit::Fahrenheit } else { TemperatureUnit::Celsius })
}
