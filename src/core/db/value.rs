/// Value Module
///
/// Parameter and column values exchanged with a driver, and the type
/// detection used to pick a binding hint for free-form queries.
use std::fmt;

/// A single parameter or column value.
///
/// `Real` and `Blob` have no dedicated binding hint; they are bound with the
/// driver's native conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text value
    Text(String),
    /// Integer value (64-bit)
    Integer(i64),
    /// Boolean value
    Bool(bool),
    /// SQL NULL
    Null,
    /// Floating point value (64-bit)
    Real(f64),
    /// Binary data
    Blob(Vec<u8>),
}

/// Binding hint passed to the driver alongside a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    Str,
    Int,
    Null,
    Bool,
}

/// Classifies a value for binding.
///
/// Checks run in a fixed order: text, integer, null, boolean. Anything else
/// is unknown and yields `None`, meaning "bind without a hint".
pub fn detect_type(value: &Value) -> Option<TypeHint> {
    match value {
        Value::Text(_) => Some(TypeHint::Str),
        Value::Integer(_) => Some(TypeHint::Int),
        Value::Null => Some(TypeHint::Null),
        Value::Bool(_) => Some(TypeHint::Bool),
        Value::Real(_) | Value::Blob(_) => None,
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text rendering used when a value is bound with a string hint.
    ///
    /// `Null` and `Blob` have no text form.
    pub fn text_form(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Value::Real(f) => Some(f.to_string()),
            Value::Null | Value::Blob(_) => None,
        }
    }

    /// Converts the value into its JSON counterpart for object-shaped rows.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Null => serde_json::Value::Null,
            // NaN and infinities have no JSON form
            Value::Real(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Blob(b) => serde_json::Value::from(b.clone()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => write!(f, "NULL"),
            Value::Real(r) => write!(f, "{}", r),
            Value::Blob(b) => write!(f, "<BLOB: {} bytes>", b.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
