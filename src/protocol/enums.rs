#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::EnumEntry;

/// A MAVLink enum: an ordered list of named, valued options.
///
/// Enums are mergeable at schema-load time: loading a second definition under the same name
/// appends its entries to the existing list rather than replacing it (see
/// [`Enum::merge`]).
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Enum {
    name: String,
    description: String,
    entries: Vec<EnumEntry>,
}

impl Enum {
    /// Default constructor.
    pub fn new(name: String, description: String, entries: Vec<EnumEntry>) -> Self {
        Self {
            name,
            description,
            entries,
        }
    }

    /// Enum name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enum description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Entries, in declaration order (with entries from later-merged definitions appended).
    pub fn entries(&self) -> &[EnumEntry] {
        &self.entries
    }

    /// Looks up an entry by name.
    pub fn entry_by_name(&self, name: &str) -> Option<&EnumEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Looks up an entry by numeric value.
    pub fn entry_by_value(&self, value: u64) -> Option<&EnumEntry> {
        self.entries.iter().find(|e| e.value() == value)
    }

    /// Appends another definition's entries to this enum (duplicate XML `<enum>` blocks with the
    /// same name across dialect files merge this way, rather than one replacing the other).
    pub fn merge(&mut self, other: Enum) {
        self.entries.extend(other.entries);
    }

    /// Returns the names of every entry whose value bit is set in `bits`.
    pub fn decode_bitmask(&self, bits: u64) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.value() != 0 && bits & e.value() == e.value())
            .map(|e| e.name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensors() -> Enum {
        Enum::new(
            "MAV_SYS_STATUS_SENSOR".to_string(),
            String::new(),
            vec![
                EnumEntry::new("MAV_SYS_STATUS_SENSOR_3D_GYRO".to_string(), 0x01, String::new(), vec![]),
                EnumEntry::new("MAV_SYS_STATUS_SENSOR_3D_ACCEL".to_string(), 0x02, String::new(), vec![]),
                EnumEntry::new("MAV_SYS_STATUS_SENSOR_BATTERY".to_string(), 0x20, String::new(), vec![]),
            ],
        )
    }

    #[test]
    fn decodes_bitmask() {
        let e = sensors();
        let mut names = e.decode_bitmask(0x21);
        names.sort();
        assert_eq!(
            names,
            vec![
                "MAV_SYS_STATUS_SENSOR_3D_GYRO".to_string(),
                "MAV_SYS_STATUS_SENSOR_BATTERY".to_string(),
            ]
        );
    }

    #[test]
    fn merges_entries_by_appending() {
        let mut e = sensors();
        let extra = Enum::new(
            "MAV_SYS_STATUS_SENSOR".to_string(),
            String::new(),
            vec![EnumEntry::new(
                "MAV_SYS_STATUS_SENSOR_GPS".to_string(),
                0x04,
                String::new(),
                vec![],
            )],
        );
        e.merge(extra);
        assert_eq!(e.entries().len(), 4);
        assert!(e.entry_by_name("MAV_SYS_STATUS_SENSOR_GPS").is_some());
    }
}
