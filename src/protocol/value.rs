#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A decoded field value.
///
/// Message schema is loaded at runtime, so there is no per-message struct to hang typed fields
/// off of: every field value, whatever its wire type, is represented by this tagged union and
/// carried in a [`crate::protocol::Content`] map keyed by field name.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    /// A signed scalar integer field.
    Int(i64),
    /// An unsigned scalar integer field.
    UInt(u64),
    /// A scalar `float`/`double` field.
    Float(f64),
    /// A `char[N]` field, decoded as a zero-terminated string.
    Text(String),
    /// A signed integer array field.
    IntVec(Vec<i64>),
    /// An unsigned integer array field.
    UIntVec(Vec<u64>),
    /// A `float[N]`/`double[N]` array field.
    FloatVec(Vec<f64>),
    /// An enum-bound scalar field, resolved to its entry name.
    EnumName(String),
    /// An enum-bound bitmask field, resolved to the set of entry names whose bit is set.
    EnumSet(Vec<String>),
}

impl Value {
    /// Interprets this value as a signed integer, if it holds one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Interprets this value as an unsigned integer, if it holds one.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::UInt(v) => Some(*v),
            Value::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Interprets this value as a float, if it holds a numeric scalar.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::UInt(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Interprets this value as text, if it holds a string or enum symbol.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v.as_str()),
            Value::EnumName(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::UInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// An insertion-ordered field-name to [`Value`] mapping.
///
/// Declaration order (not reordered-for-wire order) is preserved so that callers iterating a
/// [`Content`] see fields in the same order they appear in the XML definition.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Content(Vec<(String, Value)>);

impl Content {
    /// Creates an empty content map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a field's value, preserving first-insertion order.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        if let Some(slot) = self.0.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.0.push((name, value));
        }
    }

    /// Looks up a field's value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Iterates over `(field name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Whether every `(field, expected)` pair in `predicate` matches this content's values.
    pub fn matches(&self, predicate: &Content) -> bool {
        predicate
            .iter()
            .all(|(field, expected)| self.get(field) == Some(expected))
    }
}

impl FromIterator<(String, Value)> for Content {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut content = Content::new();
        for (name, value) in iter {
            content.insert(name, value);
        }
        content
    }
}
