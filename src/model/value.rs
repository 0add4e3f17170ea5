use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// String-keyed mapping carried verbatim to the remote.
pub type Mapping = serde_json::Map<String, serde_json::Value>;

/// The closed set of value kinds a parameter or command argument can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    String,
    FloatList,
    IntList,
    StringList,
    Mapping,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::FloatList => "float_list",
            Self::IntList => "int_list",
            Self::StringList => "string_list",
            Self::Mapping => "mapping",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "bool" => Some(Self::Bool),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "string" => Some(Self::String),
            "float_list" => Some(Self::FloatList),
            "int_list" => Some(Self::IntList),
            "string_list" => Some(Self::StringList),
            "mapping" => Some(Self::Mapping),
            _ => None,
        }
    }

    /// The value a freshly created remote parameter of this kind holds.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::String => Value::String(String::new()),
            Self::FloatList => Value::FloatList(Vec::new()),
            Self::IntList => Value::IntList(Vec::new()),
            Self::StringList => Value::StringList(Vec::new()),
            Self::Mapping => Value::Mapping(Mapping::new()),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tagged parameter value or command argument.
///
/// Serializes to plain JSON. Deserialization picks the narrowest kind that
/// fits: whole numbers become `Int`, arrays of whole numbers (and empty
/// arrays) become `IntList`. [`Value::coerce`] widens them where the
/// declared kind asks for floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "serde_json::Value", try_from = "serde_json::Value")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    FloatList(Vec<f64>),
    IntList(Vec<i64>),
    StringList(Vec<String>),
    Mapping(Mapping),
}

/// A value that does not fit the kind it was checked against.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("expected {expected}, found {found}")]
pub struct CoerceError {
    pub expected: ValueKind,
    pub found: String,
}

impl CoerceError {
    fn new(expected: ValueKind, found: &Value) -> Self {
        Self {
            expected,
            found: found.describe(),
        }
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::FloatList(_) => ValueKind::FloatList,
            Self::IntList(_) => ValueKind::IntList,
            Self::StringList(_) => ValueKind::StringList,
            Self::Mapping(_) => ValueKind::Mapping,
        }
    }

    /// Convert `self` into a value of `kind`, or explain why it cannot be.
    ///
    /// Integers widen to floats (also element-wise in lists), an empty list
    /// fits every list kind, and non-finite floats never fit. Nothing is
    /// ever narrowed.
    pub fn coerce(self, kind: ValueKind) -> Result<Value, CoerceError> {
        match (kind, self) {
            (ValueKind::Float, Value::Float(f)) => {
                if f.is_finite() {
                    Ok(Value::Float(f))
                } else {
                    Err(CoerceError::new(kind, &Value::Float(f)))
                }
            }
            (ValueKind::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
            (ValueKind::FloatList, Value::FloatList(items)) => {
                if items.iter().all(|f| f.is_finite()) {
                    Ok(Value::FloatList(items))
                } else {
                    Err(CoerceError::new(kind, &Value::FloatList(items)))
                }
            }
            (ValueKind::FloatList, Value::IntList(items)) => {
                Ok(Value::FloatList(items.into_iter().map(|i| i as f64).collect()))
            }
            (ValueKind::IntList, Value::FloatList(items)) if items.is_empty() => {
                Ok(Value::IntList(Vec::new()))
            }
            (ValueKind::StringList, Value::IntList(items)) if items.is_empty() => {
                Ok(Value::StringList(Vec::new()))
            }
            (ValueKind::StringList, Value::FloatList(items)) if items.is_empty() => {
                Ok(Value::StringList(Vec::new()))
            }
            (ValueKind::FloatList, Value::StringList(items)) if items.is_empty() => {
                Ok(Value::FloatList(Vec::new()))
            }
            (ValueKind::IntList, Value::StringList(items)) if items.is_empty() => {
                Ok(Value::IntList(Vec::new()))
            }
            (kind, value) if value.kind() == kind => Ok(value),
            (kind, value) => Err(CoerceError::new(kind, &value)),
        }
    }

    /// Short human-readable description used in mismatch messages.
    pub fn describe(&self) -> String {
        match self {
            Self::String(s) => format!("string {:?}", s),
            Self::Float(f) if !f.is_finite() => format!("non-finite float {}", f),
            Self::Mapping(_) => "mapping".to_string(),
            other => format!("{} {}", other.kind(), other),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self.clone())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        use serde_json::Value as Json;
        match value {
            Value::Bool(b) => Json::Bool(b),
            Value::Int(i) => Json::from(i),
            Value::Float(f) => Json::from(f),
            Value::String(s) => Json::String(s),
            Value::FloatList(items) => Json::Array(items.into_iter().map(Json::from).collect()),
            Value::IntList(items) => Json::Array(items.into_iter().map(Json::from).collect()),
            Value::StringList(items) => Json::Array(items.into_iter().map(Json::String).collect()),
            Value::Mapping(map) => Json::Object(map),
        }
    }
}

/// JSON that has no [`Value`] representation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FromJsonError {
    #[error("null has no value kind")]
    Null,

    #[error("integer out of the signed 64-bit range: {0}")]
    IntegerRange(String),

    #[error("list elements must share one kind: {0}")]
    MixedList(String),
}

impl TryFrom<serde_json::Value> for Value {
    type Error = FromJsonError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value as Json;
        match json {
            Json::Null => Err(FromJsonError::Null),
            Json::Bool(b) => Ok(Value::Bool(b)),
            Json::Number(n) => number_value(&n),
            Json::String(s) => Ok(Value::String(s)),
            Json::Object(map) => Ok(Value::Mapping(map)),
            Json::Array(items) => list_value(items),
        }
    }
}

fn number_value(n: &serde_json::Number) -> Result<Value, FromJsonError> {
    if let Some(i) = n.as_i64() {
        Ok(Value::Int(i))
    } else if n.is_u64() {
        Err(FromJsonError::IntegerRange(n.to_string()))
    } else {
        n.as_f64()
            .map(Value::Float)
            .ok_or_else(|| FromJsonError::IntegerRange(n.to_string()))
    }
}

fn list_value(items: Vec<serde_json::Value>) -> Result<Value, FromJsonError> {
    use serde_json::Value as Json;

    if items.iter().all(|v| v.as_i64().is_some()) {
        return Ok(Value::IntList(items.iter().filter_map(Json::as_i64).collect()));
    }
    if items.iter().all(Json::is_number) {
        return Ok(Value::FloatList(items.iter().filter_map(Json::as_f64).collect()));
    }
    if items.iter().all(Json::is_string) {
        let strings = items
            .into_iter()
            .filter_map(|v| match v {
                Json::String(s) => Some(s),
                _ => None,
            })
            .collect();
        return Ok(Value::StringList(strings));
    }
    Err(FromJsonError::MixedList(Json::Array(items).to_string()))
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
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

impl From<Vec<f64>> for Value {
    fn from(items: Vec<f64>) -> Self {
        Value::FloatList(items)
    }
}

impl From<Vec<i64>> for Value {
    fn from(items: Vec<i64>) -> Self {
        Value::IntList(items)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::StringList(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::StringList(items.into_iter().map(str::to_string).collect())
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}
