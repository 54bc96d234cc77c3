#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single option (or bitmask flag) within an [`Enum`](super::Enum).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EnumEntry {
    name: String,
    value: u64,
    description: String,
    params: Vec<String>,
}

impl EnumEntry {
    /// Default constructor.
    pub fn new(name: String, value: u64, description: String, params: Vec<String>) -> Self {
        Self {
            name,
            value,
            description,
            params,
        }
    }

    /// Entry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entry numeric value.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Entry description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// `MAV_CMD`-style parameter descriptions, in `index` order.
    pub fn params(&self) -> &[String] {
        &self.params
    }
}
