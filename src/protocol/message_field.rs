#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{MavType, Units};

/// A single field within a [`Message`](super::Message).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MessageField {
    name: String,
    description: String,
    r#type: MavType,
    r#enum: Option<String>,
    bitmask: bool,
    units: Option<Units>,
    print_format: Option<String>,
    extension: bool,
}

impl MessageField {
    /// Default constructor.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        description: String,
        r#type: MavType,
        r#enum: Option<String>,
        bitmask: bool,
        units: Option<Units>,
        print_format: Option<String>,
        extension: bool,
    ) -> Self {
        Self {
            name,
            description,
            r#type,
            r#enum,
            bitmask,
            units,
            print_format,
            extension,
        }
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Resolved field type.
    pub fn r#type(&self) -> &MavType {
        &self.r#type
    }

    /// Name of the enum this field is bound to, if any.
    pub fn r#enum(&self) -> Option<&str> {
        self.r#enum.as_deref()
    }

    /// Whether this field should be decoded as a bitmask (a set of enum entry names) rather than
    /// a single resolved entry name.
    pub fn bitmask(&self) -> bool {
        self.bitmask
    }

    /// Measurement units, if specified.
    pub fn units(&self) -> Option<&Units> {
        self.units.as_ref()
    }

    /// Print-format hint (e.g. `"%.3f"`), if specified.
    pub fn print_format(&self) -> Option<&str> {
        self.print_format.as_deref()
    }

    /// Whether this field is a v2-only message extension field.
    pub fn extension(&self) -> bool {
        self.extension
    }
}
