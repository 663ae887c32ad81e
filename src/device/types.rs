use std::str::FromStr;
use btleplug::api::BDAddr;

use crate::error::MugError;

/// The hardware address of one physical mug; used as the connection cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MugAddress(BDAddr);

impl MugAddress {
    pub fn bdaddr(&self) -> BDAddr {
        self.0
    }
}

impl FromStr for MugAddress {
    type Err = MugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BDAddr::from_str(s.trim())
            .map(MugAddress)
            .map_err(|source| MugError::InvalidAddress { address: s.to_string(), source })
    }
}

impl std::fmt::Display for MugAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn is_fahrenheit(self) -> bool {
        self == TemperatureUnit::Fahrenheit
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = match self {
            TemperatureUnit::Celsius => "Celsius",
            TemperatureUnit::Fahrenheit => "Fahrenheit",
        };

        write!(f, "{}", result)
    }
}

impl FromStr for TemperatureUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" | "celsius" => Ok(TemperatureUnit::Celsius),
            "f" | "fahrenheit" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(format!("unknown temperature unit {:?} (expected celsius or fahrenheit)", s)),
        }
    }
}

/// LED color of the mug, in the RGBA byte order the mug uses on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MugColor(pub [u8; 4]);

impl MugColor {
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl TryFrom<&[u8]> for MugColor {
    type Error = MugError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; 4]>::try_from(bytes)
            .map(MugColor)
            .map_err(|_| MugError::InvalidColor { length: bytes.len() })
    }
}

/// Parses `RRGGBBAA` (an optional leading `#` is allowed).
impl FromStr for MugColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 8 || !hex.is_ascii() {
            return Err(format!("color must be 8 hex digits (RRGGBBAA), got {:?}", s));
        }

        let mut bytes = [0u8; 4];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|err| format!("color must be 8 hex digits (RRGGBBAA), got {:?}: {}", s, err))?;
        }
        Ok(MugColor(bytes))
    }
}

impl std::fmt::Display for MugColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [r, g, b, a] = self.0;
        write!(f, "{:02X}{:02X}{:02X}{:02X}", r, g, b, a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MugStatus {
    pub current_temp: f64,
    pub target_temp: f64,
    pub battery_percent: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_parses_and_prints_uppercase() {
        let address: MugAddress = "c8:2b:96:1a:02:7f".parse().unwrap();
        assert_eq!(address.to_string(), "C8:2B:96:1A:02:7F");
        assert_eq!(address, "C8:2B:96:1A:02:7F".parse().unwrap());
    }

    #[test]
    fn malformed_address_is_rejected() {
        for input in ["", "C8:2B:96:1A:02", "C8:2B:96:1A:02:ZZ", "not a mac"] {
            match input.parse::<MugAddress>() {
                Err(MugError::InvalidAddress { address, .. }) => assert_eq!(address, input),
                other => panic!("expected InvalidAddress for {:?}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn color_hex_parsing() {
        assert_eq!("FF8000CC".parse::<MugColor>(), Ok(MugColor([0xFF, 0x80, 0x00, 0xCC])));
        assert_eq!("#00ff00ff".parse::<MugColor>(), Ok(MugColor([0x00, 0xFF, 0x00, 0xFF])));
        assert!("FF8000".parse::<MugColor>().is_err());
        assert!("GG8000CC".parse::<MugColor>().is_err());
        assert!("ÿÿÿÿ".parse::<MugColor>().is_err());
        assert_eq!(MugColor([0x0A, 0xB0, 0x01, 0xFF]).to_string(), "0AB001FF");
    }

    #[test]
    fn color_from_slice_requires_four_bytes() {
        assert_eq!(MugColor::try_from(&[1u8, 2, 3, 4][..]).unwrap(), MugColor([1, 2, 3, 4]));
        assert!(matches!(MugColor::try_from(&[1u8, 2, 3][..]), Err(MugError::InvalidColor { length: 3 })));
        assert!(matches!(MugColor::try_from(&[0u8; 5][..]), Err(MugError::InvalidColor { length: 5 })));
    }

    #[test]
    fn unit_parsing() {
        assert_eq!("Fahrenheit".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Fahrenheit));
        assert_eq!("c".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Celsius));
        assert!("kelvin".parse::<TemperatureUnit>().is_err());
    }
}
