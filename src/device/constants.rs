use std::str::FromStr;
use uuid::Uuid;

/**
 * How long (milliseconds) enabling the adapter and connecting to the mug may take.
 */
pub const CONNECT_DEADLINE: u64 = 20000;

/**
 * How long (milliseconds) discovering the mug service and its characteristics may take.
 */
pub const DISCOVERY_DEADLINE: u64 = 10000;

/**
 * How long (milliseconds) a single read from / write to a characteristic may take.
 */
pub const IO_DEADLINE: u64 = 2000;

/**
 * How often (milliseconds) to look for the requested address while waiting for the mug to show up.
 */
pub const POLL_DELAY: u64 = 200;

/**
 * The most bytes taken from a single characteristic read.
 */
pub const READ_BUFFER_LEN: usize = 8;

/**
 * The longest mug name (in bytes) the mug accepts.
 */
pub const MUG_NAME_MAX_LEN: usize = 14;

/**
 * The UUID of the Bluetooth BLE service that holds every mug characteristic.
 */
pub const MUG_SERVICE: Uuid = Uuid::from_u128(0xfc543622_236c_4c94_8fa9_944a3e5353fa);

pub const MUG_NAME_CHARACTERISTIC: Uuid = Uuid::from_u128(0xfc540001_236c_4c94_8fa9_944a3e5353fa);
pub const CURRENT_TEMP_CHARACTERISTIC: Uuid = Uuid::from_u128(0xfc540002_236c_4c94_8fa9_944a3e5353fa);
pub const TARGET_TEMP_CHARACTERISTIC: Uuid = Uuid::from_u128(0xfc540003_236c_4c94_8fa9_944a3e5353fa);
pub const TEMPERATURE_UNIT_CHARACTERISTIC: Uuid = Uuid::from_u128(0xfc540004_236c_4c94_8fa9_944a3e5353fa);
pub const BATTERY_CHARACTERISTIC: Uuid = Uuid::from_u128(0xfc540007_236c_4c94_8fa9_944a3e5353fa);
pub const MUG_COLOR_CHARACTERISTIC: Uuid = Uuid::from_u128(0xfc540014_236c_4c94_8fa9_944a3e5353fa);

/// A logical mug attribute, backed by one characteristic of [`MUG_SERVICE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    CurrentTemp,
    TargetTemp,
    TemperatureUnit,
    Battery,
    MugName,
    MugColor,
}

impl Attribute {
    /// Every attribute; a connection is only usable once all of them are discovered.
    pub const ALL: [Attribute; 6] = [
        Attribute::CurrentTemp,
        Attribute::TargetTemp,
        Attribute::TemperatureUnit,
        Attribute::Battery,
        Attribute::MugName,
        Attribute::MugColor,
    ];

    pub fn uuid(self) -> Uuid {
        match self {
            Attribute::CurrentTemp => CURRENT_TEMP_CHARACTERISTIC,
            Attribute::TargetTemp => TARGET_TEMP_CHARACTERISTIC,
            Attribute::TemperatureUnit => TEMPERATURE_UNIT_CHARACTERISTIC,
            Attribute::Battery => BATTERY_CHARACTERISTIC,
            Attribute::MugName => MUG_NAME_CHARACTERISTIC,
            Attribute::MugColor => MUG_COLOR_CHARACTERISTIC,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Attribute::CurrentTemp => "current-temp",
            Attribute::TargetTemp => "target-temp",
            Attribute::TemperatureUnit => "unit",
            Attribute::Battery => "battery",
            Attribute::MugName => "name",
            Attribute::MugColor => "color",
        }
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::ALL
            .into_iter()
            .find(|attribute| attribute.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Attribute::ALL.iter().map(|a| a.name()).collect();
                format!("unknown characteristic {:?} (expected one of: {})", s, names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_match_the_device_contract() {
        assert_eq!(MUG_SERVICE.to_string(), "fc543622-236c-4c94-8fa9-944a3e5353fa");
        assert_eq!(Attribute::CurrentTemp.uuid().to_string(), "fc540002-236c-4c94-8fa9-944a3e5353fa");
        assert_eq!(Attribute::TargetTemp.uuid().to_string(), "fc540003-236c-4c94-8fa9-944a3e5353fa");
        assert_eq!(Attribute::TemperatureUnit.uuid().to_string(), "fc540004-236c-4c94-8fa9-944a3e5353fa");
        assert_eq!(Attribute::Battery.uuid().to_string(), "fc540007-236c-4c94-8fa9-944a3e5353fa");
        assert_eq!(Attribute::MugName.uuid().to_string(), "fc540001-236c-4c94-8fa9-944a3e5353fa");
        assert_eq!(Attribute::MugColor.uuid().to_string(), "fc540014-236c-4c94-8fa9-944a3e5353fa");
    }

    #[test]
    fn attribute_names_parse_back() {
        for attribute in Attribute::ALL {
            assert_eq!(attribute.name().parse::<Attribute>(), Ok(attribute));
        }
        assert!("humidity".parse::<Attribute>().is_err());
    }
}
