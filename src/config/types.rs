use serde::{Deserialize, Serialize};

use crate::device::types::MugAddress;
use crate::error::MugError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// MAC address used when none is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
}

impl Config {
    pub fn default_address(&self) -> Result<Option<MugAddress>, MugError> {
        match self.mac.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(mac) => mac.parse().map(Some),
        }
    }
}
