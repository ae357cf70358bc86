//! Host configuration loading.
//!
//! Turns a host TOML file into untyped [`RawConfig`] maps, one per configured
//! driver. Loading never validates parameters: that stays with each driver's
//! factory, which knows the schema.
//!
//! # File Layout
//!
//! ```toml
//! [drivers.ph_probe]
//! driver = "ph-ezo"
//!
//! [drivers.ph_probe.parameters]
//! Address = 99
//! Delay = 500
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use hal_core::config::load_host_config;
//! use std::path::Path;
//!
//! let host = load_host_config(Path::new("config/hal.toml"))?;
//! for (id, entry) in &host.drivers {
//!     println!("{id}: {}", entry.driver);
//! }
//! ```

use crate::value::{ConfigValue, RawConfig};
use anyhow::{Context, Result};
use figment::{
    providers::{Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Error types for config loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    /// File not found
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Parse error (invalid TOML or wrong shape)
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// Parameters were not given as a table/object
    #[error("Expected a table of parameters, found {0}")]
    NotATable(String),
}

/// Configuration of one driver instance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DriverConfig {
    /// Name of the driver factory (matches `Metadata::name`)
    pub driver: String,

    /// Untyped parameters passed to the factory
    #[serde(default)]
    pub parameters: RawConfig,
}

/// Top-level host configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HostConfig {
    /// Driver instances keyed by instance id
    #[serde(default)]
    pub drivers: BTreeMap<String, DriverConfig>,
}

impl HostConfig {
    /// Instances configured for the driver named `driver`.
    pub fn instances_of<'a>(
        &'a self,
        driver: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a DriverConfig)> + 'a {
        self.drivers
            .iter()
            .filter(move |(_, cfg)| cfg.driver == driver)
            .map(|(id, cfg)| (id.as_str(), cfg))
    }
}

/// Load a host configuration from a TOML file.
pub fn load_host_config(path: &Path) -> Result<HostConfig> {
    if !path.exists() {
        return Err(ConfigLoadError::NotFound(path.display().to_string()).into());
    }

    debug!("Loading host config from: {}", path.display());

    let config: HostConfig = Figment::new()
        .merge(Toml::file(path))
        .extract()
        .map_err(|e| ConfigLoadError::Parse(e.to_string()))
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    info!(drivers = config.drivers.len(), "Loaded host config");
    Ok(config)
}

/// Parse a host configuration from a TOML string.
pub fn parse_host_config(source: &str) -> Result<HostConfig> {
    Figment::new()
        .merge(Toml::string(source))
        .extract()
        .map_err(|e| ConfigLoadError::Parse(e.to_string()).into())
}

/// Build a [`RawConfig`] from a TOML table.
pub fn raw_config_from_toml(table: &toml::Table) -> RawConfig {
    table
        .iter()
        .map(|(key, value)| (key.clone(), ConfigValue::from(value)))
        .collect()
}

/// Build a [`RawConfig`] from a JSON object.
pub fn raw_config_from_json(value: &serde_json::Value) -> Result<RawConfig, ConfigLoadError> {
    let object = value
        .as_object()
        .ok_or_else(|| ConfigLoadError::NotATable(value.to_string()))?;

    Ok(object
        .iter()
        .map(|(key, value)| (key.clone(), ConfigValue::from(value)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
        [drivers.ph_probe]
        driver = "ph-ezo"

        [drivers.ph_probe.parameters]
        Address = 99
        Delay = "500"

        [drivers.spare]
        driver = "ph-ezo"
    "#;

    #[test]
    fn test_parse_host_config() {
        let config = parse_host_config(SAMPLE).unwrap();
        assert_eq!(config.drivers.len(), 2);

        let tank = &config.drivers["ph_probe"];
        assert_eq!(tank.driver, "ph-ezo");
        assert_eq!(tank.parameters["Address"], ConfigValue::Integer(99));
        assert_eq!(tank.parameters["Delay"], ConfigValue::from("500"));

        assert!(config.drivers["spare"].parameters.is_empty());
    }

    #[test]
    fn test_instances_of_filters_by_driver() {
        let config = parse_host_config(SAMPLE).unwrap();
        let ids: Vec<&str> = config.instances_of("ph-ezo").map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["ph_probe", "spare"]);
        assert_eq!(config.instances_of("other").count(), 0);
    }

    #[test]
    fn test_load_host_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = load_host_config(file.path()).unwrap();
        assert!(config.drivers.contains_key("ph_probe"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_host_config(Path::new("/nonexistent/hal.toml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_missing_driver_name_is_parse_error() {
        let err = parse_host_config("[drivers.x]\nparameters = {}\n").unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config"));
    }

    #[test]
    fn test_raw_config_from_toml() {
        let table: toml::Table = toml::from_str("Address = 68\nDelay = 1600.0\n").unwrap();
        let raw = raw_config_from_toml(&table);
        assert_eq!(raw["Address"], ConfigValue::Integer(68));
        assert_eq!(raw["Delay"], ConfigValue::Float(1600.0));
    }

    #[test]
    fn test_raw_config_from_json() {
        let raw = raw_config_from_json(&serde_json::json!({"Address": "99"})).unwrap();
        assert_eq!(raw["Address"], ConfigValue::from("99"));

        let err = raw_config_from_json(&serde_json::json!([1, 2])).unwrap_err();
        assert!(matches!(err, ConfigLoadError::NotATable(_)));
    }
}
