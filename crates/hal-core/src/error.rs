//! Error types shared by the driver factories.
//!
//! [`HalError`] is what a host sees when a factory refuses to build a driver or
//! a bus transaction fails. Validation problems are collected into a
//! [`ValidationReport`](crate::driver::ValidationReport) first and only flattened
//! into [`HalError::InvalidParameters`] at construction time, so the host can
//! present one diagnostic string.
//!
//! ## Error Taxonomy
//!
//! - **Missing required field**: a mandatory parameter is absent.
//! - **Coercion failure**: a value cannot be interpreted as the declared type.
//! - **Range violation**: a coerced value falls outside its allowed bounds.
//!
//! All three are caller-fixable configuration errors. None of them is retried.

use thiserror::Error;

/// Convenience alias for results using [`HalError`].
pub type HalResult<T> = std::result::Result<T, HalError>;

/// Why a coercion failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionErrorKind {
    /// The value is not of the requested kind at all (`"abc"`, `1.5`, `true`).
    Invalid,
    /// The value is integral but does not fit the target type.
    ///
    /// `saturated` is the nearest representable value, so range checks can
    /// still report it.
    OutOfRange {
        /// Nearest representable value
        saturated: i64,
    },
}

/// Failure to narrow an untyped [`ConfigValue`](crate::value::ConfigValue).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot convert {value} to {target}")]
pub struct CoercionError {
    /// Printable form of the rejected value
    pub value: String,
    /// Name of the requested type
    pub target: &'static str,
    /// Failure category
    pub kind: CoercionErrorKind,
}

impl CoercionError {
    /// Create a coercion error for a value that is not of the `target` kind.
    pub fn new(value: impl Into<String>, target: &'static str) -> Self {
        Self {
            value: value.into(),
            target,
            kind: CoercionErrorKind::Invalid,
        }
    }

    /// Create a coercion error for an integral value outside the `target` range.
    pub fn out_of_range(value: impl Into<String>, target: &'static str, saturated: i64) -> Self {
        Self {
            value: value.into(),
            target,
            kind: CoercionErrorKind::OutOfRange { saturated },
        }
    }

    /// Nearest representable value when the input was integral.
    pub fn saturated(&self) -> Option<i64> {
        match self.kind {
            CoercionErrorKind::OutOfRange { saturated } => Some(saturated),
            CoercionErrorKind::Invalid => None,
        }
    }
}

/// Primary error type for driver factories and drivers.
#[derive(Error, Debug)]
pub enum HalError {
    /// Configuration rejected by a factory's validator.
    ///
    /// The payload is the aggregated, human-readable list of every failure and
    /// is also the complete `Display` output.
    #[error("{0}")]
    InvalidParameters(String),

    /// A value could not be coerced after validation accepted it.
    #[error("Coercion error: {0}")]
    Coercion(#[from] CoercionError),

    /// The addressed bus reported an error.
    #[error("Bus error: {0}")]
    Bus(String),
}

impl HalError {
    /// Wrap a transport failure.
    pub fn bus(err: impl std::fmt::Display) -> Self {
        Self::Bus(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameters_display_is_bare_message() {
        let err = HalError::InvalidParameters("Address is out of range.".to_string());
        assert_eq!(err.to_string(), "Address is out of range.");
    }

    #[test]
    fn test_coercion_error_converts() {
        let err: HalError = CoercionError::new("abc", "integer").into();
        assert!(matches!(err, HalError::Coercion(_)));
        assert_eq!(err.to_string(), "Coercion error: cannot convert abc to integer");
    }

    #[test]
    fn test_saturated_only_for_out_of_range() {
        assert_eq!(CoercionError::new("abc", "integer").saturated(), None);
        let err = CoercionError::out_of_range("1e+30", "integer", i64::MAX);
        assert_eq!(err.saturated(), Some(i64::MAX));
        assert_eq!(err.kind, CoercionErrorKind::OutOfRange { saturated: i64::MAX });
    }

    #[test]
    fn test_bus_error_from_anyhow() {
        let err = HalError::bus(anyhow::anyhow!("nack at 0x63"));
        assert_eq!(err.to_string(), "Bus error: nack at 0x63");
    }
}
