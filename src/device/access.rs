use crate::device::codec;
use crate::device::constants::Attribute;
use crate::device::connection::MugSession;
use crate::device::stack::BleStack;
use crate::device::types::{MugAddress, MugColor, MugStatus, TemperatureUnit};
use crate::error::MugError;

impl<S: BleStack> MugSession<S> {
    /// Current liquid temperature in °C.
    pub async fn read_current_temp(&self, address: &MugAddress) -> Result<f64, MugError> {
        let bytes = self.read(address, Attribute::CurrentTemp).await?;
        codec::decode_temperature(&bytes)
    }

    /// Temperature (°C) the mug heats to.
    pub async fn read_target_temp(&self, address: &MugAddress) -> Result<f64, MugError> {
        let bytes = self.read(address, Attribute::TargetTemp).await?;
        codec::decode_temperature(&bytes)
    }

    pub async fn read_battery_percent(&self, address: &MugAddress) -> Result<u8, MugError> {
        let bytes = self.read(address, Attribute::Battery).await?;
        codec::decode_battery(&bytes)
    }

    pub async fn read_mug_name(&self, address: &MugAddress) -> Result<String, MugError> {
        let bytes = self.read(address, Attribute::MugName).await?;
        Ok(codec::decode_name(&bytes))
    }

    pub async fn read_mug_color(&self, address: &MugAddress) -> Result<MugColor, MugError> {
        let bytes = self.read(address, Attribute::MugColor).await?;
        codec::decode_color(&bytes)
    }

    pub async fn read_temperature_unit(&self, address: &MugAddress) -> Result<TemperatureUnit, MugError> {
        let bytes = self.read(address, Attribute::TemperatureUnit).await?;
        codec::decode_unit(&bytes)
    }

    pub async fn read_status(&self, address: &MugAddress) -> Result<MugStatus, MugError> {
        Ok(MugStatus {
            current_temp: self.read_current_temp(address).await?,
            target_temp: self.read_target_temp(address).await?,
            battery_percent: self.read_battery_percent(address).await?,
        })
    }

    pub async fn set_target_temp(&self, address: &MugAddress, celsius: f64) -> Result<(), MugError> {
        let value = codec::encode_temperature(celsius)?;
        self.write(address, Attribute::TargetTemp, &value).await
    }

    /// Names longer than 14 bytes are cut, see [`codec::truncate_to_14_bytes`].
    pub async fn set_mug_name(&self, address: &MugAddress, name: &str) -> Result<(), MugError> {
        let value = codec::encode_name(name);
        self.write(address, Attribute::MugName, &value).await
    }

    /// `rgba` must be exactly 4 bytes.
    pub async fn set_mug_color(&self, address: &MugAddress, rgba: &[u8]) -> Result<(), MugError> {
        let value = codec::encode_color(rgba)?;
        self.write(address, Attribute::MugColor, &value).await
    }

    pub async fn set_temperature_unit(&self, address: &MugAddress, unit: TemperatureUnit) -> Result<(), MugError> {
        let value = codec::encode_unit(unit);
        self.write(address, Attribute::TemperatureUnit, &value).await
    }
}
