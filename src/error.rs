use std::io;
use std::str::Utf8Error;
use std::time::Duration;
use thiserror::Error;
use btleplug;
use btleplug::api::ParseBDAddrError;
use serde_json;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine path to config file")]
    NoConfigPath,

    #[error("Failed to decode config as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read config file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse config file: {source}")]
    JsonError { #[from] source: serde_json::Error },
}

impl ConfigError {
    pub fn is_file_not_found_error(&self) -> bool {
        match self {
            ConfigError::IOError { source } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum MugError {
    #[error("Invalid mug address {address:?}: {source}")]
    InvalidAddress { address: String, source: ParseBDAddrError },

    #[error("No usable bluetooth adapter found")]
    NoAdapter,

    #[error("Failed to connect to mug {address}: {source}")]
    Connection { address: String, source: btleplug::Error },

    #[error("The mug does not expose service {service}")]
    ServiceNotFound { service: Uuid },

    #[error("The mug does not expose characteristic {characteristic}")]
    CharacteristicNotFound { characteristic: Uuid },

    #[error("Characteristic {characteristic} was not discovered on this connection")]
    CharacteristicNotCached { characteristic: Uuid },

    #[error("Expected at least {expected} byte(s) from the mug, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    #[error("A color must be exactly 4 bytes (RGBA), got {length}")]
    InvalidColor { length: usize },

    #[error("Temperature {value}°C can not be encoded (valid range is 0 to 655.35)")]
    TemperatureOutOfRange { value: f64 },

    #[error("Bluetooth operation '{operation}' did not finish within {deadline:?}")]
    Timeout { operation: &'static str, deadline: Duration },

    #[error("Bluetooth operation '{operation}' was cancelled")]
    Cancelled { operation: &'static str },

    #[error("Error communicating with mug (btleplug): {source}")]
    Btle { #[from] source: btleplug::Error },
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to initialize logging: {source}")]
    Logger { #[from] source: log::SetLoggerError },

    #[error("Failed to open LOG_FILE: {source}")]
    LogFile { source: io::Error },

    #[error("Failed to start async runtime: {source}")]
    Runtime { source: io::Error },

    #[error("Failed to load config: {source}")]
    ConfigError { #[from] source: ConfigError },

    #[error("{source}")]
    Mug { #[from] source: MugError },

    #[error("No mug address given; pass --mac or set \"mac\" in the config file")]
    MissingAddress,
}
