//! Atlas Scientific EZO pH Board Driver
//!
//! Bus: I2C, factory default address 0x44 (68)
//! The board needs ~1.6 s after a reading command before the result is ready,
//! exposed here as the configurable `Delay`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hal_core::{BuildDriver, DriverFactory, RawConfig, ConfigValue};
//!
//! let factory = hal_driver_ezo::factory();
//!
//! let mut config = RawConfig::new();
//! config.insert("Address".into(), ConfigValue::from(99));
//!
//! let driver = factory.new_driver(&config, bus.clone())?;
//! ```

use hal_core::driver::{
    BuildDriver, Capability, ConfigParameter, Driver, DriverFactory, Metadata, ParameterType,
    ValidationReport,
};
use hal_core::error::{CoercionError, HalError, HalResult};
use hal_core::value::{ConfigValue, RawConfig};
use hal_core::SharedBus;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Driver name reported in metadata.
pub const EZO_NAME: &str = "ph-ezo";

const EZO_DESCRIPTION: &str = "Atlas Scientific EZO board for pH sensor";

/// Name of the bus address parameter.
pub const ADDRESS_PARAM: &str = "Address";

/// Name of the response delay parameter (milliseconds).
pub const DELAY_PARAM: &str = "Delay";

/// Factory default I2C address of the EZO pH board.
pub const DEFAULT_ADDRESS: i64 = 68;

/// Minimum response latency of the board in milliseconds.
pub const DEFAULT_DELAY_MS: i64 = 1600;

const ADDRESS_MIN: i64 = 0;
const ADDRESS_MAX: i64 = 255;

fn ezo_metadata() -> Metadata {
    Metadata::new(EZO_NAME, EZO_DESCRIPTION, [Capability::AnalogInput])
}

// =============================================================================
// EzoFactory - DriverFactory implementation
// =============================================================================

/// Factory for EZO pH board drivers.
///
/// Only one instance exists per process, obtained through [`factory`].
#[derive(Debug)]
pub struct EzoFactory {
    meta: Metadata,
    parameters: Vec<ConfigParameter>,
}

static EZO_FACTORY: OnceLock<EzoFactory> = OnceLock::new();

/// Process-wide EZO driver factory.
///
/// Built on first access; concurrent first callers all receive the same fully
/// initialized instance. Never torn down.
pub fn factory() -> &'static EzoFactory {
    EZO_FACTORY.get_or_init(|| {
        debug!(driver = EZO_NAME, "Initializing driver factory");
        EzoFactory::new()
    })
}

impl EzoFactory {
    fn new() -> Self {
        Self {
            meta: ezo_metadata(),
            parameters: vec![
                ConfigParameter::new(ADDRESS_PARAM, ParameterType::Integer, 0, DEFAULT_ADDRESS),
                ConfigParameter::new(DELAY_PARAM, ParameterType::Integer, 1, DEFAULT_DELAY_MS),
            ],
        }
    }

    /// Coerce `raw` to an integer, recording a failure when it is not one.
    ///
    /// Integral values beyond `i64` saturate, so they reach the range checks.
    /// Returns 0 on failure so the caller's range checks still run.
    fn coerce_or_record(report: &mut ValidationReport, name: &str, raw: &ConfigValue) -> i64 {
        match raw.coerce_to_int_saturating() {
            Ok(value) => value,
            Err(_) => {
                report.record(
                    name,
                    format!("{} is not an integer. {} was received.", name, raw),
                );
                0
            }
        }
    }

    fn validate_address(report: &mut ValidationReport, config: &RawConfig) {
        let Some(raw) = config.get(ADDRESS_PARAM) else {
            report.record(
                ADDRESS_PARAM,
                format!(
                    "{} is not a required parameter, but was not found.",
                    ADDRESS_PARAM
                ),
            );
            return;
        };

        let value = Self::coerce_or_record(report, ADDRESS_PARAM, raw);
        if !(ADDRESS_MIN..=ADDRESS_MAX).contains(&value) {
            report.record(
                ADDRESS_PARAM,
                format!(
                    "{} is out of range. It should be between {} and {}, but {} was received.",
                    ADDRESS_PARAM, ADDRESS_MIN, ADDRESS_MAX, raw
                ),
            );
        }
    }

    fn validate_delay(report: &mut ValidationReport, config: &RawConfig) {
        // Optional: the default applies at construction time.
        let Some(raw) = config.get(DELAY_PARAM) else {
            return;
        };

        let value = Self::coerce_or_record(report, DELAY_PARAM, raw);
        if value < 0 {
            report.record(
                DELAY_PARAM,
                format!("{} must be positive. {} was received.", DELAY_PARAM, raw),
            );
        }
    }

    fn int_param(config: &RawConfig, name: &str) -> HalResult<Option<i64>> {
        config
            .get(name)
            .map(|raw| raw.coerce_to_int_saturating().map_err(HalError::from))
            .transpose()
    }
}

impl DriverFactory for EzoFactory {
    fn metadata(&self) -> &Metadata {
        &self.meta
    }

    fn parameters(&self) -> &[ConfigParameter] {
        &self.parameters
    }

    fn validate_parameters(&self, config: &RawConfig) -> ValidationReport {
        let mut report = ValidationReport::new();

        Self::validate_address(&mut report, config);
        Self::validate_delay(&mut report, config);

        if !report.is_valid() {
            debug!(
                driver = EZO_NAME,
                failing = report.failures().len(),
                "EZO configuration rejected"
            );
        }
        report
    }
}

impl BuildDriver for EzoFactory {
    type Resources = SharedBus;
    type Driver = AtlasEzo;

    fn new_driver(&self, config: &RawConfig, bus: SharedBus) -> HalResult<AtlasEzo> {
        if let Err(e) = self
            .validate_parameters(config)
            .into_result(&self.parameters)
        {
            warn!(driver = EZO_NAME, error = %e, "Refusing to build EZO driver");
            return Err(e);
        }

        let address = Self::int_param(config, ADDRESS_PARAM)?.ok_or_else(|| {
            HalError::InvalidParameters(format!("{} was not found.", ADDRESS_PARAM))
        })?;
        let addr =
            u8::try_from(address).map_err(|_| CoercionError::new(address.to_string(), "u8"))?;

        let delay_ms = Self::int_param(config, DELAY_PARAM)?.unwrap_or(DEFAULT_DELAY_MS);
        let delay_ms =
            u64::try_from(delay_ms).map_err(|_| CoercionError::new(delay_ms.to_string(), "u64"))?;

        info!(driver = EZO_NAME, address = addr, delay_ms, "Built EZO driver");

        Ok(AtlasEzo {
            addr,
            bus,
            delay: Duration::from_millis(delay_ms),
            meta: self.meta.clone(),
        })
    }
}

// =============================================================================
// AtlasEzo
// =============================================================================

/// Driver instance for one EZO pH board.
///
/// Holds a clone of the host's bus handle; closing the driver leaves the bus
/// open for the other devices on it.
pub struct AtlasEzo {
    addr: u8,
    bus: SharedBus,
    delay: Duration,
    meta: Metadata,
}

impl std::fmt::Debug for AtlasEzo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtlasEzo")
            .field("addr", &self.addr)
            .field("delay", &self.delay)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

impl AtlasEzo {
    /// I2C address of the board.
    pub fn address(&self) -> u8 {
        self.addr
    }

    /// Time to wait between a command and reading its response.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Bus the board is attached to.
    pub fn bus(&self) -> &SharedBus {
        &self.bus
    }

    /// Send an ASCII command to the board.
    pub fn write_command(&self, command: &str) -> HalResult<()> {
        self.bus
            .write_bytes(self.addr, command.as_bytes())
            .map_err(HalError::bus)
    }

    /// Read `len` raw response bytes from the board.
    pub fn read_response(&self, len: usize) -> HalResult<Vec<u8>> {
        self.bus.read_bytes(self.addr, len).map_err(HalError::bus)
    }
}

impl Driver for AtlasEzo {
    fn metadata(&self) -> &Metadata {
        &self.meta
    }

    fn close(&self) -> HalResult<()> {
        debug!(address = self.addr, "Closing EZO driver");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal_core::{I2cBus, MockBus};

    fn config(entries: &[(&str, ConfigValue)]) -> RawConfig {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_factory_metadata() {
        let meta = factory().metadata();
        assert_eq!(meta.name, "ph-ezo");
        assert_eq!(meta.description, "Atlas Scientific EZO board for pH sensor");
        assert_eq!(meta.capabilities, vec![Capability::AnalogInput]);
    }

    #[test]
    fn test_factory_parameters() {
        let params = factory().parameters();
        assert_eq!(params.len(), 2);

        assert_eq!(params[0].name, "Address");
        assert_eq!(params[0].parameter_type, ParameterType::Integer);
        assert_eq!(params[0].order, 0);
        assert_eq!(params[0].default, ConfigValue::Integer(68));

        assert_eq!(params[1].name, "Delay");
        assert_eq!(params[1].parameter_type, ParameterType::Integer);
        assert_eq!(params[1].order, 1);
        assert_eq!(params[1].default, ConfigValue::Integer(1600));
    }

    #[test]
    fn test_missing_address_message() {
        let report = factory().validate_parameters(&RawConfig::new());
        assert_eq!(
            report.messages_for("Address"),
            ["Address is not a required parameter, but was not found."]
        );
        assert!(report.messages_for("Delay").is_empty());
    }

    #[test]
    fn test_non_integer_address_message() {
        let report = factory().validate_parameters(&config(&[("Address", "abc".into())]));
        assert_eq!(
            report.messages_for("Address"),
            ["Address is not an integer. abc was received."]
        );
    }

    #[test]
    fn test_out_of_range_address_message() {
        let report = factory().validate_parameters(&config(&[("Address", 300.into())]));
        assert_eq!(
            report.messages_for("Address"),
            ["Address is out of range. It should be between 0 and 255, but 300 was received."]
        );
    }

    #[test]
    fn test_address_beyond_i64_is_out_of_range() {
        let report = factory().validate_parameters(&config(&[("Address", 1e30.into())]));
        assert_eq!(
            report.messages_for("Address"),
            ["Address is out of range. It should be between 0 and 255, but 1e+30 was received."]
        );

        let report = factory().validate_parameters(&config(&[("Address", u64::MAX.into())]));
        assert_eq!(
            report.messages_for("Address"),
            [format!(
                "Address is out of range. It should be between 0 and 255, but {} was received.",
                u64::MAX
            )]
        );
    }

    #[test]
    fn test_delay_beyond_i64_saturates() {
        let report = factory()
            .validate_parameters(&config(&[("Address", 68.into()), ("Delay", (-1e30).into())]));
        assert_eq!(
            report.messages_for("Delay"),
            ["Delay must be positive. -1e+30 was received."]
        );

        let driver = factory()
            .new_driver(
                &config(&[("Address", 68.into()), ("Delay", "9223372036854775808".into())]),
                MockBus::shared(),
            )
            .unwrap();
        assert_eq!(driver.delay(), Duration::from_millis(i64::MAX as u64));
    }

    #[test]
    fn test_delay_messages() {
        let report = factory().validate_parameters(&config(&[
            ("Address", 99.into()),
            ("Delay", (-1).into()),
        ]));
        assert_eq!(
            report.messages_for("Delay"),
            ["Delay must be positive. -1 was received."]
        );

        let report = factory().validate_parameters(&config(&[
            ("Address", 99.into()),
            ("Delay", 1.5.into()),
        ]));
        assert_eq!(
            report.messages_for("Delay"),
            ["Delay is not an integer. 1.5 was received."]
        );
    }

    #[test]
    fn test_failures_accumulate_across_parameters() {
        let report = factory().validate_parameters(&config(&[("Delay", (-5).into())]));
        assert!(!report.is_valid());
        assert_eq!(report.failures().len(), 2);
    }

    #[test]
    fn test_new_driver_binds_bus_without_io() {
        let mock = MockBus::shared();
        let driver = factory()
            .new_driver(&config(&[("Address", 99.into())]), mock.clone())
            .unwrap();

        assert_eq!(driver.address(), 99);
        assert!(mock.writes().is_empty());

        driver.write_command("R").unwrap();
        let writes = mock.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].addr, 99);
        assert_eq!(writes[0].data, b"R");
    }

    #[test]
    fn test_read_response_surfaces_bus_error() {
        let driver = factory()
            .new_driver(&config(&[("Address", 99.into())]), MockBus::shared())
            .unwrap();
        let err = driver.read_response(7).unwrap_err();
        assert!(matches!(err, HalError::Bus(_)));
    }

    #[test]
    fn test_close_leaves_bus_usable() {
        let mock = MockBus::shared();
        let driver = factory()
            .new_driver(&config(&[("Address", 99.into())]), mock.clone())
            .unwrap();
        driver.close().unwrap();

        mock.push_response(99, vec![1]);
        assert_eq!(mock.read_bytes(99, 1).unwrap(), vec![1]);
    }
}
