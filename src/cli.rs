use std::time::Duration;
use clap::{ArgAction, Parser, Subcommand};
use log::{debug, LevelFilter};

use crate::config;
use crate::device::constants::Attribute;
use crate::device::stack::BleStack;
use crate::device::types::{MugAddress, MugColor, TemperatureUnit};
use crate::device::MugSession;
use crate::error::{AppRunError, MugError};

/// Control an Ember smart mug over bluetooth.
#[derive(Debug, Parser)]
#[command(name = "embermug", version)]
pub struct Cli {
    /// MAC address of the mug; defaults to "mac" from embermug.json
    #[arg(long, global = true, value_parser = parse_address)]
    pub mac: Option<MugAddress>,

    /// How long connecting to the mug may take (e.g. "20s", "1m")
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Log more; repeat for even more
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show mug status (temp, target temp, battery)
    Status,
    /// Read a single characteristic
    Get {
        /// One of: current-temp, target-temp, battery, name, color, unit
        #[arg(long = "char")]
        characteristic: Attribute,
    },
    /// Set the temperature (°C) the mug heats to
    SetTargetTemp {
        #[arg(long)]
        temp: f64,
    },
    /// Set the mug name (at most 14 bytes are kept)
    SetName {
        #[arg(long)]
        name: String,
    },
    /// Set the LED color
    SetColor {
        /// RRGGBBAA hex
        #[arg(long)]
        color: MugColor,
    },
    /// Set the temperature unit shown by the mug and its app
    SetUnit {
        #[arg(long)]
        unit: TemperatureUnit,
    },
}

fn parse_address(s: &str) -> Result<MugAddress, MugError> {
    s.parse()
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    async fn address(&self) -> Result<MugAddress, AppRunError> {
        if let Some(address) = self.mac {
            return Ok(address);
        }

        let config = config::io::load().await?;
        match config.default_address()? {
            Some(address) => {
                debug!("Using mug {} from config file", address);
                Ok(address)
            },
            None => Err(AppRunError::MissingAddress),
        }
    }
}

pub async fn execute<S: BleStack>(cli: &Cli, session: &MugSession<S>) -> Result<(), AppRunError> {
    let address = cli.address().await?;

    match &cli.command {
        Command::Status => print_status(session, &address).await,
        Command::Get { characteristic } => print_characteristic(session, &address, *characteristic).await?,
        Command::SetTargetTemp { temp } => session.set_target_temp(&address, *temp).await?,
        Command::SetName { name } => session.set_mug_name(&address, name).await?,
        Command::SetColor { color } => session.set_mug_color(&address, color.as_bytes()).await?,
        Command::SetUnit { unit } => session.set_temperature_unit(&address, *unit).await?,
    }

    Ok(())
}

// Each line is independent; one failing read does not hide the others.
async fn print_status<S: BleStack>(session: &MugSession<S>, address: &MugAddress) {
    match session.read_current_temp(address).await {
        Ok(temp) => println!("Current temperature: {:.2}°C", temp),
        Err(err) => println!("failed to read current temperature: {}", err),
    }

    match session.read_target_temp(address).await {
        Ok(temp) => println!("Target temperature: {:.2}°C", temp),
        Err(err) => println!("failed to read target temperature: {}", err),
    }

    match session.read_battery_percent(address).await {
        Ok(battery) => println!("Battery: {}%", battery),
        Err(err) => println!("failed to read battery: {}", err),
    }
}

async fn print_characteristic<S: BleStack>(session: &MugSession<S>, address: &MugAddress, attribute: Attribute) -> Result<(), MugError> {
    match attribute {
        Attribute::CurrentTemp => println!("{:.2}°C", session.read_current_temp(address).await?),
        Attribute::TargetTemp => println!("{:.2}°C", session.read_target_temp(address).await?),
        Attribute::Battery => println!("{}%", session.read_battery_percent(address).await?),
        Attribute::MugName => println!("{}", session.read_mug_name(address).await?),
        Attribute::MugColor => println!("{}", session.read_mug_color(address).await?),
        Attribute::TemperatureUnit => println!("{}", session.read_temperature_unit(address).await?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_set_color() {
        let cli = Cli::try_parse_from(["embermug", "set-color", "--mac", "C8:2B:96:1A:02:7F", "--color", "FF000080"]).unwrap();
        assert_eq!(cli.mac, Some("C8:2B:96:1A:02:7F".parse().unwrap()));
        match cli.command {
            Command::SetColor { color } => assert_eq!(color, MugColor([0xFF, 0x00, 0x00, 0x80])),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["embermug", "get", "--char", "battery", "--timeout", "5s", "-vv"]).unwrap();
        assert_eq!(cli.mac, None);
        assert_eq!(cli.timeout, Some(Duration::from_secs(5)));
        assert_eq!(cli.log_level(), LevelFilter::Debug);
        assert!(matches!(cli.command, Command::Get { characteristic: Attribute::Battery }));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Cli::try_parse_from(["embermug", "status", "--mac", "not-a-mac"]).is_err());
        assert!(Cli::try_parse_from(["embermug", "get", "--char", "humidity"]).is_err());
        assert!(Cli::try_parse_from(["embermug", "set-color", "--color", "FF00"]).is_err());
        assert!(Cli::try_parse_from(["embermug", "set-unit", "--unit", "kelvin"]).is_err());
    }

    #[test]
    fn cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
