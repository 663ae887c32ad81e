pub mod access;
pub mod codec;
pub mod connection;
pub mod constants;
pub mod stack;
pub mod types;

pub use connection::{Connection, MugSession, SessionOptions};
pub use constants::Attribute;
pub use stack::{BleDevice, BleStack, BtleplugDevice, BtleplugStack};
pub use types::{MugAddress, MugColor, MugStatus, TemperatureUnit};
