use std::env::current_exe;
use std::path::{Path, PathBuf};
use std::str;
use directories_next::BaseDirs;
use log::{debug, warn};
use serde_json;
use tokio::fs;

use crate::config::types::Config;
use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "embermug.json";

// creates a path to CONFIG_FILE_NAME in the same directory as the executable
// this could be useful for usb sticks
fn get_portable_config_path() -> Option<PathBuf> {
    match current_exe() {
        Ok(path) => path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)),
        Err(err) => {
            warn!("failed to get current exe path: {:?}", err);
            None
        },
    }
}

// creates a path to CONFIG_FILE_NAME in an os dependent standard directory, such as ~/.config on linux
// or %AppData% on windows.
fn get_local_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

pub fn get_config_path() -> Result<PathBuf, ConfigError> {
    if let Some(path) = get_portable_config_path() {
        if path.is_file() {
            return Ok(path);
        }
    }

    match get_local_config_path() {
        None => Err(ConfigError::NoConfigPath),
        Some(path) => Ok(path),
    }
}

/// Reads the config file; a file that does not exist yields the default config.
pub async fn load() -> Result<Config, ConfigError> {
    let path = get_config_path()?;
    load_from(&path).await
}

pub async fn load_from(path: &Path) -> Result<Config, ConfigError> {
    debug!("Reading config file {}", path.to_string_lossy());

    let content = match fs::read(path).await {
        Ok(content) => content,
        Err(source) => {
            let err = ConfigError::from(source);
            if err.is_file_not_found_error() {
                return Ok(Config::default());
            }
            return Err(err);
        },
    };

    let content = str::from_utf8(&content)?;
    if content.trim().is_empty() {
        return Ok(Config::default());
    }

    Ok(serde_json::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("embermug-{}-{}.json", process::id(), name))
    }

    #[tokio::test]
    async fn missing_file_is_default() {
        let config = load_from(&temp_path("does-not-exist")).await.unwrap();
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn reads_mac() {
        let path = temp_path("mac");
        std::fs::write(&path, r#"{ "mac": "C8:2B:96:1A:02:7F" }"#).unwrap();
        let config = load_from(&path).await;
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.unwrap().mac.as_deref(), Some("C8:2B:96:1A:02:7F"));
    }

    #[tokio::test]
    async fn empty_file_is_default() {
        let path = temp_path("empty");
        std::fs::write(&path, "\n").unwrap();
        let config = load_from(&path).await;
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.unwrap(), Config::default());
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let path = temp_path("malformed");
        std::fs::write(&path, "{ mac: ").unwrap();
        let config = load_from(&path).await;
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(config, Err(ConfigError::JsonError { .. })));
    }
}
