//! Atlas Scientific EZO drivers for the hardware abstraction host.
//!
//! This crate provides the driver factory for the EZO pH circuit, an I2C board
//! that reports pH as an analog input.
//!
//! # Usage
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! hal-driver-ezo = { path = "../hal-driver-ezo" }
//! ```
//!
//! Hand the factory to the host and build drivers from validated configuration:
//!
//! ```rust,ignore
//! use hal_core::{BuildDriver, DriverFactory};
//!
//! let factory = hal_driver_ezo::factory();
//! let report = factory.validate_parameters(&config);
//! if report.is_valid() {
//!     let driver = factory.new_driver(&config, bus)?;
//! }
//! ```

mod ezo;

pub use ezo::{
    factory, AtlasEzo, EzoFactory, ADDRESS_PARAM, DEFAULT_ADDRESS, DEFAULT_DELAY_MS, DELAY_PARAM,
    EZO_NAME,
};
