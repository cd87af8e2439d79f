use crate::error::{ExporterError, Result as ExporterResult};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    /// Hostname or IP of the switch, optionally with `:port`
    #[serde(default)]
    pub address: String,
    #[serde(default = "empty_secret")]
    pub password: SecretString,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Newer firmware expects the login password in obfuscated form. On by
    /// default, matching how unrecognised firmware versions are treated.
    #[serde(default = "default_obfuscate_password")]
    pub obfuscate_password: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9707
}

fn default_timeout() -> u64 {
    10
}

fn default_obfuscate_password() -> bool {
    true
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            password: empty_secret(),
            timeout_seconds: default_timeout(),
            obfuscate_password: default_obfuscate_password(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

impl DeviceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("GS1200_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Reject configurations the exporter cannot start with.
    pub fn validate(&self) -> ExporterResult<()> {
        if self.device.address.trim().is_empty() {
            return Err(ExporterError::Config(
                "switch address is required (GS1200_ADDRESS)".to_string(),
            ));
        }
        if self.device.password.expose_secret().is_empty() {
            return Err(ExporterError::Config(
                "switch password is required (GS1200_PASSWORD)".to_string(),
            ));
        }
        if self.device.timeout_seconds == 0 {
            return Err(ExporterError::Config(
                "timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
