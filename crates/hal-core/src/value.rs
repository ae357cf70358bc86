//! Untyped configuration values.
//!
//! Hosts collect driver configuration from files, APIs and user input, so a
//! value may arrive as an integer, a float or a string depending on where it
//! came from. [`ConfigValue`] keeps that value as received and narrows it only
//! on request through an explicit, total coercion.

use crate::error::CoercionError;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Raw configuration keyed by parameter name.
pub type RawConfig = HashMap<String, ConfigValue>;

/// A dynamically typed configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Native integer, wide enough for any signed or unsigned 64-bit source
    Integer(i128),
    /// Floating point number
    Float(f64),
    /// Text, possibly holding a number
    String(String),
    /// Boolean flag
    Boolean(bool),
    /// Anything else (arrays, tables, null, datetimes), kept as a description
    Other(String),
}

fn saturate(negative: bool) -> i64 {
    if negative {
        i64::MIN
    } else {
        i64::MAX
    }
}

/// Optional sign followed by at least one ASCII digit.
fn is_decimal_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl ConfigValue {
    /// Coerce this value to an integer.
    ///
    /// Accepts integers, floats with no fractional part and decimal integer
    /// strings with an optional sign. Integral values outside `i64` fail with
    /// [`CoercionErrorKind::OutOfRange`](crate::error::CoercionErrorKind), every
    /// other rejection is `Invalid`.
    pub fn try_coerce_to_int(&self) -> Result<i64, CoercionError> {
        match self {
            Self::Integer(v) => i64::try_from(*v).map_err(|_| {
                CoercionError::out_of_range(self.to_string(), "integer", saturate(*v < 0))
            }),
            // i64::MAX as f64 is 2^63, one past the largest i64
            Self::Float(f) => {
                if !f.is_finite() || f.fract() != 0.0 {
                    Err(CoercionError::new(self.to_string(), "integer"))
                } else if *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Ok(*f as i64)
                } else {
                    Err(CoercionError::out_of_range(
                        self.to_string(),
                        "integer",
                        saturate(*f < 0.0),
                    ))
                }
            }
            Self::String(s) => match s.parse::<i64>() {
                Ok(v) => Ok(v),
                Err(_) if is_decimal_literal(s) => Err(CoercionError::out_of_range(
                    s.clone(),
                    "integer",
                    saturate(s.starts_with('-')),
                )),
                Err(_) => Err(CoercionError::new(s.clone(), "integer")),
            },
            Self::Boolean(_) | Self::Other(_) => {
                Err(CoercionError::new(self.to_string(), "integer"))
            }
        }
    }

    /// Like [`try_coerce_to_int`](Self::try_coerce_to_int), but integral values
    /// outside `i64` clamp to `i64::MIN`/`i64::MAX` instead of failing.
    pub fn coerce_to_int_saturating(&self) -> Result<i64, CoercionError> {
        self.try_coerce_to_int()
            .or_else(|err| err.saturated().ok_or(err))
    }
}

/// Format a float the way it is echoed back in diagnostics.
///
/// Shortest round-trip digits. Exponent form (`1e+30`, `1e-05`) is used when the
/// decimal exponent is below -4 or reaches the precision limit, which is 6, or
/// the digit count when that is smaller and covers the integer part.
fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    if v == 0.0 {
        return v.to_string();
    }

    let sci = format!("{:e}", v);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return v.to_string();
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return v.to_string();
    };

    let digits = mantissa.bytes().filter(u8::is_ascii_digit).count() as i32;
    let point = exp + 1;
    let mut limit = 6;
    if limit > digits && digits >= point {
        limit = digits;
    }

    if exp < -4 || exp >= limit {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    } else {
        v.to_string()
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => f.write_str(&format_float(*v)),
            Self::String(s) => f.write_str(s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Other(desc) => f.write_str(desc),
        }
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        Self::Integer(i128::from(v))
    }
}

impl From<u64> for ConfigValue {
    fn from(v: u64) -> Self {
        Self::Integer(i128::from(v))
    }
}

impl From<i32> for ConfigValue {
    fn from(v: i32) -> Self {
        Self::Integer(i128::from(v))
    }
}

impl From<u8> for ConfigValue {
    fn from(v: u8) -> Self {
        Self::Integer(i128::from(v))
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&toml::Value> for ConfigValue {
    fn from(value: &toml::Value) -> Self {
        match value {
            toml::Value::Integer(v) => Self::Integer(i128::from(*v)),
            toml::Value::Float(v) => Self::Float(*v),
            toml::Value::String(s) => Self::String(s.clone()),
            toml::Value::Boolean(b) => Self::Boolean(*b),
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<&serde_json::Value> for ConfigValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Self::Integer(i128::from(v))
                } else if let Some(v) = n.as_u64() {
                    Self::Integer(i128::from(v))
                } else if let Some(f) = n.as_f64() {
                    Self::Float(f)
                } else {
                    Self::Other(n.to_string())
                }
            }
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Bool(b) => Self::Boolean(*b),
            serde_json::Value::Null => Self::Other("null".to_string()),
            other => Self::Other(other.to_string()),
        }
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Integer(v) => match i64::try_from(*v) {
                Ok(v) => serializer.serialize_i64(v),
                Err(_) => serializer.serialize_i128(*v),
            },
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::String(s) => serializer.serialize_str(s),
            Self::Boolean(b) => serializer.serialize_bool(*b),
            Self::Other(desc) => serializer.serialize_str(desc),
        }
    }
}

struct ConfigValueVisitor;

impl<'de> Visitor<'de> for ConfigValueVisitor {
    type Value = ConfigValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a configuration value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Integer(i128::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Integer(i128::from(v)))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Integer(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<ConfigValue, E> {
        Ok(match i128::try_from(v) {
            Ok(v) => ConfigValue::Integer(v),
            Err(_) => ConfigValue::String(v.to_string()),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<ConfigValue, E> {
        Ok(ConfigValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<ConfigValue, E> {
        Ok(ConfigValue::String(v))
    }

    fn visit_char<E: de::Error>(self, v: char) -> Result<ConfigValue, E> {
        Ok(ConfigValue::String(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<ConfigValue, E> {
        Ok(ConfigValue::Other("null".to_string()))
    }

    fn visit_none<E: de::Error>(self) -> Result<ConfigValue, E> {
        self.visit_unit()
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<ConfigValue, D::Error> {
        ConfigValue::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ConfigValue, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<ConfigValue>()? {
            items.push(item.to_string());
        }
        Ok(ConfigValue::Other(format!("[{}]", items.join(", "))))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ConfigValue, A::Error> {
        let mut entries = Vec::new();
        while let Some((key, value)) = map.next_entry::<String, ConfigValue>()? {
            entries.push(format!("{} = {}", key, value));
        }
        Ok(ConfigValue::Other(format!("{{{}}}", entries.join(", "))))
    }
}

impl<'de> Deserialize<'de> for ConfigValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ConfigValueVisitor)
    }
}
