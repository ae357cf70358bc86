//! `hal-core`
//!
//! Core types and traits shared between the hardware abstraction host and the
//! driver crates it loads.
//!
//! A driver crate exposes a [`DriverFactory`] that the host can interrogate
//! without knowing anything about the hardware behind it:
//!
//! 1. [`DriverFactory::metadata`] and [`DriverFactory::parameters`] describe the
//!    driver and the configuration it expects.
//! 2. [`DriverFactory::validate_parameters`] checks an untyped [`RawConfig`] and
//!    explains every problem it finds in a [`ValidationReport`].
//! 3. [`BuildDriver::new_driver`] re-validates and binds the configuration to a
//!    hardware resource such as a [`SharedBus`].
//!
//! ## Key Types
//!
//! - [`ConfigValue`]: dynamically typed configuration value with explicit coercion
//! - [`ConfigParameter`]: one entry of a driver's configuration schema
//! - [`Capability`]: what a driver offers to the host (analog input, PWM, ...)
//! - [`I2cBus`]: addressed-bus capability injected into drivers
//! - [`HalError`]: error type for validation, coercion and bus failures

pub mod bus;
pub mod config;
pub mod driver;
pub mod error;
pub mod value;

pub use bus::{BusWrite, I2cBus, MockBus, SharedBus};
pub use config::{load_host_config, DriverConfig, HostConfig};
pub use driver::{
    BuildDriver, Capability, ConfigParameter, Driver, DriverFactory, Metadata, ParameterType,
    ValidationReport,
};
pub use error::{CoercionError, CoercionErrorKind, HalError, HalResult};
pub use value::{ConfigValue, RawConfig};
