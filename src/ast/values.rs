use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::RowPageError;

/// A literal value, either inline in the plan or bound to a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    String(String),
    /// Date and time without zone
    DateTime(NaiveDateTime),
}

impl Value {
    /// The value as a non-negative row count, if it is one.
    pub fn as_count(&self) -> Option<u64> {
        match self {
            Value::Int(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.3f")),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl TryFrom<u64> for Value {
    type Error = RowPageError;

    fn try_from(n: u64) -> Result<Self, Self::Error> {
        i64::try_from(n)
            .map(Value::Int)
            .map_err(|_| RowPageError::bound(n.to_string(), "value exceeds the integer range"))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

/// A named placeholder bound to a host-supplied value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Slot name without the dialect prefix (e.g. `__p_0`)
    pub name: String,
    /// Bound value
    pub value: Value,
    /// Declared width for string parameters
    #[serde(default)]
    pub size: Option<u32>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            size: None,
        }
    }

    /// Declare the width of the slot.
    pub fn sized(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// `placeholder: value (Size = n)`, as listed next to a statement.
    pub fn describe(&self, placeholder: &str) -> String {
        match self.size {
            Some(size) => format!("{}: {} (Size = {})", placeholder, self.value, size),
            None => format!("{}: {}", placeholder, self.value),
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe(&format!("@{}", self.name)))
    }
}
