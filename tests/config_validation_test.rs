//! Configuration validation tests
//!
//! Tests that verify configuration defaults and validation rules.

use gs1200_exporter::config::{Config, DeviceConfig, ServerConfig};
use gs1200_exporter::error::ExporterError;
use gs1200_exporter::gs1200::password::firmware_requires_obfuscation;
use secrecy::SecretString;
use std::time::Duration;

fn valid_config() -> Config {
    Config {
        device: DeviceConfig {
            address: "192.168.1.3".to_string(),
            password: SecretString::from("secret"),
            ..DeviceConfig::default()
        },
        server: ServerConfig::default(),
    }
}

#[test]
fn test_default_server_config() {
    // Given: ServerConfig with default values
    let config = ServerConfig::default();

    // Then: Binds all interfaces on the exporter's registered port
    assert_eq!(config.addr, "0.0.0.0");
    assert_eq!(config.port, 9707);
}

#[test]
fn test_default_device_config() {
    // Given: DeviceConfig with default values
    let config = DeviceConfig::default();

    // Then: No address, obfuscated password and a ten second timeout
    assert!(config.address.is_empty());
    assert_eq!(config.timeout_seconds, 10);
    assert_eq!(config.timeout(), Duration::from_secs(10));
    assert!(config.obfuscate_password);
}

#[test]
fn test_default_password_mode_matches_unknown_firmware() {
    // Given: A firmware version string the exporter does not recognise
    let expected = firmware_requires_obfuscation("unknown");

    // Then: Both the built-in default and the shipped config file agree with it
    assert_eq!(DeviceConfig::default().obfuscate_password, expected);
    let shipped = Config::load("config/Default.toml").expect("load failed");
    assert_eq!(shipped.device.obfuscate_password, expected);
}

#[test]
fn test_complete_config_is_valid() {
    assert!(valid_config().validate().is_ok());
}

#[test]
fn test_missing_address_is_rejected() {
    // Given: A config without a switch address
    let mut config = valid_config();
    config.device.address = "  ".to_string();

    // When: Validating
    let err = config.validate().unwrap_err();

    // Then: The message names the setting
    assert!(matches!(err, ExporterError::Config(_)));
    assert!(err.to_string().contains("GS1200_ADDRESS"));
}

#[test]
fn test_missing_password_is_rejected() {
    // Given: A config without a password
    let mut config = valid_config();
    config.device.password = SecretString::from("");

    // When: Validating
    let err = config.validate().unwrap_err();

    // Then: The message names the setting
    assert!(err.to_string().contains("GS1200_PASSWORD"));
}

#[test]
fn test_zero_timeout_is_rejected() {
    let mut config = valid_config();
    config.device.timeout_seconds = 0;

    assert!(config.validate().is_err());
}

#[test]
fn test_missing_config_file_uses_defaults() {
    // Given: A path that does not exist
    // When: Loading
    let config = Config::load("does/not/exist.toml").expect("load failed");

    // Then: Defaults apply
    assert_eq!(config.server.port, 9707);
    assert_eq!(config.device.timeout_seconds, 10);
    assert!(config.device.obfuscate_password);
}
