//! Value coercion: the single point of truth for interpreting untyped wire
//! values as booleans, floats or integers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A dynamically typed input value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(&'a str),
}

impl RawValue<'_> {
    /// Human-readable name of the input shape, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }
}

impl fmt::Display for RawValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => value.fmt(f),
            Self::Int(value) => value.fmt(f),
            Self::Float(value) => value.fmt(f),
            Self::Text(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<bool> for RawValue<'_> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for RawValue<'_> {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for RawValue<'_> {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for RawValue<'_> {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<'a> From<&'a str> for RawValue<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a String> for RawValue<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(value.as_str())
    }
}

/// Target representation of a coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Float,
    Int,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Float => f.write_str("float"),
            Self::Int => f.write_str("int"),
        }
    }
}

/// A value that has been coerced to its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl ModuleValue {
    /// Encode the value as it travels on the wire: `true`/`false`, integers
    /// as decimal text, floats with two fixed decimals.
    #[must_use]
    pub fn to_wire(&self) -> String {
        match self {
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => format!("{value:.2}"),
        }
    }

    /// The representation this value carries.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
        }
    }
}

impl fmt::Display for ModuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// A value could not be interpreted as the requested type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot convert {kind} value {value} to {target}")]
pub struct CoercionError {
    /// Shape of the offending input (`bool`, `integer`, `float`, `text`).
    pub kind: &'static str,
    /// The offending input, rendered.
    pub value: String,
    pub target: ValueKind,
}

impl CoercionError {
    fn new(input: RawValue<'_>, target: ValueKind) -> Self {
        Self {
            kind: input.kind(),
            value: input.to_string(),
            target,
        }
    }
}

/// Interpret `value` as a boolean.
///
/// Text accepts the literals `1 t T TRUE true True 0 f F FALSE false False`.
/// Numbers accept only the canonical `0` and `1`.
///
/// # Errors
///
/// Returns [`CoercionError`] for any other input.
pub fn to_bool<'a>(value: impl Into<RawValue<'a>>) -> Result<bool, CoercionError> {
    let value = value.into();
    match value {
        RawValue::Bool(b) => Ok(b),
        RawValue::Int(0) => Ok(false),
        RawValue::Int(1) => Ok(true),
        RawValue::Float(f) if f == 0.0 => Ok(false),
        RawValue::Float(f) if f == 1.0 => Ok(true),
        RawValue::Text("1" | "t" | "T" | "TRUE" | "true" | "True") => Ok(true),
        RawValue::Text("0" | "f" | "F" | "FALSE" | "false" | "False") => Ok(false),
        _ => Err(CoercionError::new(value, ValueKind::Bool)),
    }
}

/// Interpret `value` as a 64-bit float.
///
/// Text must be a finite decimal number; integers widen; booleans map to
/// `0.0`/`1.0`.
///
/// # Errors
///
/// Returns [`CoercionError`] when text does not parse or is not finite.
#[allow(clippy::cast_precision_loss)]
pub fn to_float<'a>(value: impl Into<RawValue<'a>>) -> Result<f64, CoercionError> {
    let value = value.into();
    match value {
        RawValue::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
        RawValue::Int(i) => Ok(i as f64),
        RawValue::Float(f) if f.is_finite() => Ok(f),
        RawValue::Text(text) => text
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .ok_or_else(|| CoercionError::new(value, ValueKind::Float)),
        RawValue::Float(_) => Err(CoercionError::new(value, ValueKind::Float)),
    }
}

/// Interpret `value` as a signed integer.
///
/// Text must be a decimal integer; floats truncate toward zero; booleans map
/// to `0`/`1`.
///
/// # Errors
///
/// Returns [`CoercionError`] when text does not parse or a float is out of
/// range.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn to_int<'a>(value: impl Into<RawValue<'a>>) -> Result<i64, CoercionError> {
    let value = value.into();
    match value {
        RawValue::Bool(b) => Ok(i64::from(b)),
        RawValue::Int(i) => Ok(i),
        RawValue::Float(f) if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
            Ok(f.trunc() as i64)
        }
        RawValue::Float(_) => Err(CoercionError::new(value, ValueKind::Int)),
        RawValue::Text(text) => text
            .parse::<i64>()
            .map_err(|_| CoercionError::new(value, ValueKind::Int)),
    }
}

/// Coerce raw wire text into the requested representation.
///
/// # Errors
///
/// Returns [`CoercionError`] when `raw` is not a valid literal for `target`.
pub fn coerce(raw: &str, target: ValueKind) -> Result<ModuleValue, CoercionError> {
    match target {
        ValueKind::Bool => to_bool(raw).map(ModuleValue::Bool),
        ValueKind::Float => to_float(raw).map(ModuleValue::Float),
        ValueKind::Int => to_int(raw).map(ModuleValue::Int),
    }
}
