//! Driver Factory and Schema Types
//!
//! This module provides the contract between the hardware abstraction host and
//! the driver crates it manages. Each driver crate exposes one factory that
//! implements [`DriverFactory`] (introspection and validation) and
//! [`BuildDriver`] (construction).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                              Host                               │
//! │  factory.metadata() / factory.parameters()                      │
//! │  collects RawConfig (file, API, UI)                             │
//! └─────────────────────────────────────────────────────────────────┘
//!                                   │
//!                                   ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              DriverFactory::validate_parameters()               │
//! │  every parameter checked, every failure recorded                │
//! └─────────────────────────────────────────────────────────────────┘
//!                                   │
//!                                   ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  BuildDriver::new_driver()                      │
//! │  re-validates, coerces, binds the injected hardware resource    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example: Implementing a Driver Factory
//!
//! ```rust,ignore
//! use hal_core::driver::{BuildDriver, DriverFactory, Metadata, ConfigParameter, ValidationReport};
//!
//! impl DriverFactory for MyFactory {
//!     fn metadata(&self) -> &Metadata { &self.meta }
//!     fn parameters(&self) -> &[ConfigParameter] { &self.parameters }
//!
//!     fn validate_parameters(&self, config: &RawConfig) -> ValidationReport {
//!         let mut report = ValidationReport::new();
//!         if !config.contains_key("Channel") {
//!             report.record("Channel", "Channel was not found.");
//!         }
//!         report
//!     }
//! }
//!
//! impl BuildDriver for MyFactory {
//!     type Resources = SharedBus;
//!     type Driver = MyDriver;
//!
//!     fn new_driver(&self, config: &RawConfig, bus: SharedBus) -> HalResult<MyDriver> {
//!         self.validate_parameters(config).into_result(self.parameters())?;
//!         Ok(MyDriver::new(bus))
//!     }
//! }
//! ```

use crate::error::{HalError, HalResult};
use crate::value::{ConfigValue, RawConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Capability Enum (Runtime Introspection)
// =============================================================================

/// Capability flags a driver declares to its host.
///
/// The host uses these to decide which drivers can serve which kind of
/// request (reading an analog channel, toggling a pin, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Reads digital pins
    DigitalInput,

    /// Drives digital pins
    DigitalOutput,

    /// Pulse-width modulated outputs
    Pwm,

    /// Reads analog values (pH, temperature, voltage)
    AnalogInput,
}

impl Capability {
    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::DigitalInput => "digital input",
            Self::DigitalOutput => "digital output",
            Self::Pwm => "pwm",
            Self::AnalogInput => "analog input",
        }
    }
}

// =============================================================================
// Metadata
// =============================================================================

/// Static description of a driver type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Driver name, unique within a host
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Declared capabilities
    pub capabilities: Vec<Capability>,
}

impl Metadata {
    /// Create metadata for a driver type.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        capabilities: impl Into<Vec<Capability>>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            capabilities: capabilities.into(),
        }
    }

    /// Whether the driver declares `capability`.
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

// =============================================================================
// Parameter Schema
// =============================================================================

/// Declared type of a configuration parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterType {
    /// Whole number
    Integer,
    /// Floating point number
    Decimal,
    /// Free text
    String,
    /// true/false
    Boolean,
}

/// One entry of a driver's configuration schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigParameter {
    /// Key in the raw configuration
    pub name: String,

    /// Declared type
    #[serde(rename = "type")]
    pub parameter_type: ParameterType,

    /// Presentation order, not used by validation
    pub order: i32,

    /// Value used when the caller omits the parameter
    pub default: ConfigValue,
}

impl ConfigParameter {
    /// Create a schema entry.
    pub fn new(
        name: impl Into<String>,
        parameter_type: ParameterType,
        order: i32,
        default: impl Into<ConfigValue>,
    ) -> Self {
        Self {
            name: name.into(),
            parameter_type,
            order,
            default: default.into(),
        }
    }
}

// =============================================================================
// Validation Report
// =============================================================================

/// Outcome of validating a raw configuration.
///
/// Maps parameter names to the failure messages they produced, in the order
/// they were recorded. A parameter without an entry passed all checks. Keys are
/// sorted, so the serialized form is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    failures: BTreeMap<String, Vec<String>>,
}

impl ValidationReport {
    /// Create an empty (valid) report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure for `parameter`.
    pub fn record(&mut self, parameter: &str, message: impl Into<String>) {
        self.failures
            .entry(parameter.to_string())
            .or_default()
            .push(message.into());
    }

    /// `true` iff no failure was recorded.
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    /// All failures keyed by parameter name.
    pub fn failures(&self) -> &BTreeMap<String, Vec<String>> {
        &self.failures
    }

    /// Failures recorded for one parameter (empty if it passed).
    pub fn messages_for(&self, parameter: &str) -> &[String] {
        self.failures
            .get(parameter)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Split into the `(valid, failures)` pair a host expects.
    pub fn into_parts(self) -> (bool, BTreeMap<String, Vec<String>>) {
        (self.failures.is_empty(), self.failures)
    }

    /// Flatten every message into one deterministic string.
    ///
    /// Parameters are visited in `schema` order, then any remaining keys sorted
    /// by name. Messages keep their recorded order and are joined by newlines.
    pub fn to_error_string(&self, schema: &[ConfigParameter]) -> String {
        let mut lines: Vec<&str> = Vec::new();

        for param in schema {
            if let Some(messages) = self.failures.get(&param.name) {
                lines.extend(messages.iter().map(String::as_str));
            }
        }

        for (key, messages) in &self.failures {
            if !schema.iter().any(|p| &p.name == key) {
                lines.extend(messages.iter().map(String::as_str));
            }
        }

        lines.join("\n")
    }

    /// `Ok(())` when valid, otherwise [`HalError::InvalidParameters`] carrying
    /// [`to_error_string`](Self::to_error_string).
    pub fn into_result(self, schema: &[ConfigParameter]) -> HalResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(HalError::InvalidParameters(self.to_error_string(schema)))
        }
    }
}

// =============================================================================
// Driver Factory Traits
// =============================================================================

/// Introspection and validation side of a driver factory.
///
/// Object safe, so a host can keep heterogeneous factories as
/// `&'static dyn DriverFactory` for listing and validation.
///
/// # Thread Safety
///
/// Factories are created once and shared for the program's lifetime. All
/// methods take `&self` and must not mutate shared state.
pub trait DriverFactory: Send + Sync + 'static {
    /// Static description of the driver type.
    fn metadata(&self) -> &Metadata;

    /// Configuration schema in display order.
    fn parameters(&self) -> &[ConfigParameter];

    /// Check `config` without building anything.
    ///
    /// Every parameter is checked; failures accumulate rather than stop at the
    /// first problem.
    fn validate_parameters(&self, config: &RawConfig) -> ValidationReport;
}

/// Construction side of a driver factory.
pub trait BuildDriver: DriverFactory {
    /// Hardware resource the driver is bound to (bus handle, pin set, ...).
    type Resources;

    /// Driver produced by this factory.
    type Driver: Driver;

    /// Validate `config` and build a driver bound to `resources`.
    ///
    /// Fails with [`HalError::InvalidParameters`] when validation does not
    /// pass. Performs no hardware I/O.
    fn new_driver(&self, config: &RawConfig, resources: Self::Resources)
        -> HalResult<Self::Driver>;
}

/// A constructed driver handed to the host.
pub trait Driver: Send + Sync {
    /// Metadata copied from the factory at construction time.
    fn metadata(&self) -> &Metadata;

    /// Release driver-held resources. Shared resources owned by the host are
    /// left untouched.
    fn close(&self) -> HalResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<ConfigParameter> {
        vec![
            ConfigParameter::new("Address", ParameterType::Integer, 0, 68),
            ConfigParameter::new("Delay", ParameterType::Integer, 1, 1600),
        ]
    }

    #[test]
    fn test_capability_name() {
        assert_eq!(Capability::AnalogInput.name(), "analog input");
        assert_eq!(Capability::Pwm.name(), "pwm");
    }

    #[test]
    fn test_capability_serde() {
        let json = serde_json::to_string(&Capability::AnalogInput).unwrap();
        assert_eq!(json, "\"analog_input\"");

        let cap: Capability = serde_json::from_str("\"digital_output\"").unwrap();
        assert_eq!(cap, Capability::DigitalOutput);
    }

    #[test]
    fn test_metadata_has_capability() {
        let meta = Metadata::new("sensor", "test sensor", [Capability::AnalogInput]);
        assert!(meta.has_capability(Capability::AnalogInput));
        assert!(!meta.has_capability(Capability::Pwm));
    }

    #[test]
    fn test_config_parameter_serializes_type_field() {
        let param = ConfigParameter::new("Address", ParameterType::Integer, 0, 68);
        let json = serde_json::to_value(&param).unwrap();
        assert_eq!(json["type"], "integer");
        assert_eq!(json["default"], 68);
    }

    #[test]
    fn test_empty_report_is_valid() {
        let report = ValidationReport::new();
        assert!(report.is_valid());
        assert!(report.messages_for("Address").is_empty());
        assert_eq!(report.to_error_string(&schema()), "");
        assert!(report.into_result(&schema()).is_ok());
    }

    #[test]
    fn test_report_keeps_only_failing_keys() {
        let mut report = ValidationReport::new();
        report.record("Delay", "Delay must be positive. -1 was received.");

        assert!(!report.is_valid());
        assert_eq!(report.failures().len(), 1);
        assert!(report.failures().contains_key("Delay"));

        let (valid, failures) = report.into_parts();
        assert!(!valid);
        assert!(!failures.contains_key("Address"));
    }

    #[test]
    fn test_error_string_follows_schema_then_record_order() {
        let mut report = ValidationReport::new();
        report.record("Delay", "d1");
        report.record("Zeta", "z1");
        report.record("Address", "a1");
        report.record("Address", "a2");
        report.record("Beta", "b1");

        assert_eq!(report.to_error_string(&schema()), "a1\na2\nd1\nb1\nz1");
    }

    #[test]
    fn test_report_serializes_with_sorted_keys() {
        let mut report = ValidationReport::new();
        report.record("Zeta", "z1");
        report.record("Delay", "d1");
        report.record("Address", "a1");
        report.record("Beta", "b1");

        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(
            json,
            r#"{"failures":{"Address":["a1"],"Beta":["b1"],"Delay":["d1"],"Zeta":["z1"]}}"#
        );
    }

    #[test]
    fn test_into_result_wraps_message() {
        let mut report = ValidationReport::new();
        report.record("Address", "a1");

        let err = report.into_result(&schema()).unwrap_err();
        assert!(matches!(err, HalError::InvalidParameters(ref msg) if msg == "a1"));
    }
}
