use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

fn type_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<schar>u)?(?P<base>int(?:8|16|32|64)_t|char|float|double)(?P<ver>_mavlink_version)?(\[(?P<count>\d+)\])?$")
            .expect("static regex is valid")
    })
}

/// Primitive kind of a message field, after stripping array/version suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Primitive {
    /// `int8_t`
    Int8,
    /// `int16_t`
    Int16,
    /// `int32_t`
    Int32,
    /// `int64_t`
    Int64,
    /// `uint8_t`
    UInt8,
    /// `uint16_t`
    UInt16,
    /// `uint32_t`
    UInt32,
    /// `uint64_t`
    UInt64,
    /// `float`
    Float,
    /// `double`
    Double,
    /// `char`
    Char,
}

impl Primitive {
    /// Byte size of a single element of this primitive kind.
    pub fn size(self) -> usize {
        match self {
            Primitive::Int8 | Primitive::UInt8 | Primitive::Char => 1,
            Primitive::Int16 | Primitive::UInt16 => 2,
            Primitive::Int32 | Primitive::UInt32 | Primitive::Float => 4,
            Primitive::Int64 | Primitive::UInt64 | Primitive::Double => 8,
        }
    }

    /// Canonical XML type name for this primitive kind (unsigned/base form, no array suffix).
    pub fn canonical_name(self) -> &'static str {
        match self {
            Primitive::Int8 => "int8_t",
            Primitive::Int16 => "int16_t",
            Primitive::Int32 => "int32_t",
            Primitive::Int64 => "int64_t",
            Primitive::UInt8 => "uint8_t",
            Primitive::UInt16 => "uint16_t",
            Primitive::UInt32 => "uint32_t",
            Primitive::UInt64 => "uint64_t",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Char => "char",
        }
    }

    /// Whether this primitive kind is a signed integer.
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Primitive::Int8 | Primitive::Int16 | Primitive::Int32 | Primitive::Int64
        )
    }
}

/// A resolved MAVLink field type: a primitive kind, an element count, and whether the field was
/// declared as the distinguished `..._mavlink_version` scalar.
///
/// `char[N]` is represented with `count = N` but decodes/encodes as a single zero-padded string,
/// never as a vector of `N` characters; see [`MessageField`](crate::protocol::MessageField).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MavType {
    base: Primitive,
    count: usize,
    mavlink_version: bool,
}

impl MavType {
    /// Parses a field type string per the MAVLink type grammar.
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        let s = s.trim();
        let caps = type_regex()
            .captures(s)
            .ok_or_else(|| SchemaError::InvalidType(s.to_string()))?;

        let base = match &caps["base"] {
            "int8_t" => Primitive::Int8,
            "int16_t" => Primitive::Int16,
            "int32_t" => Primitive::Int32,
            "int64_t" => Primitive::Int64,
            "char" => Primitive::Char,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            other => unreachable!("regex matched unknown base `{other}`"),
        };
        let signed_prefix = caps.name("schar").is_some();
        let base = if signed_prefix {
            base
        } else {
            match base {
                Primitive::Int8 => Primitive::UInt8,
                Primitive::Int16 => Primitive::UInt16,
                Primitive::Int32 => Primitive::UInt32,
                Primitive::Int64 => Primitive::UInt64,
                other => other,
            }
        };
        let mavlink_version = caps.name("ver").is_some();
        let count = match caps.name("count") {
            Some(m) => m
                .as_str()
                .parse::<usize>()
                .map_err(|_| SchemaError::InvalidType(s.to_string()))?,
            None => 1,
        };

        Ok(MavType {
            base,
            count,
            mavlink_version,
        })
    }

    /// The primitive scalar kind (element type for arrays).
    pub fn primitive(&self) -> Primitive {
        self.base
    }

    /// Number of elements (1 for scalars, N for `type[N]` and `char[N]`).
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether this is a `char[N]` string field (decodes/encodes as one string, not N chars).
    pub fn is_string(&self) -> bool {
        self.base == Primitive::Char && self.count > 1
    }

    /// Whether this is an array of scalars (excludes `char[N]`, which is a string).
    pub fn is_array(&self) -> bool {
        self.count > 1 && self.base != Primitive::Char
    }

    /// Whether this field was declared with the `_mavlink_version` suffix.
    pub fn is_mavlink_version(&self) -> bool {
        self.mavlink_version
    }

    /// Total byte size: `primitive.size() * count`.
    pub fn size(&self) -> usize {
        self.base.size() * self.count
    }

    /// Canonical type name as used in CRC-extra computation: the unsigned/base name without any
    /// `[N]` suffix, with `_mavlink_version` normalised away.
    pub fn crc_type_name(&self) -> &'static str {
        self.base.canonical_name()
    }
}

impl FromStr for MavType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MavType::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalars() {
        let t = MavType::parse("uint8_t").unwrap();
        assert_eq!(t.primitive(), Primitive::UInt8);
        assert_eq!(t.count(), 1);
        assert_eq!(t.size(), 1);
    }

    #[test]
    fn parses_arrays() {
        let t = MavType::parse("float[3]").unwrap();
        assert_eq!(t.primitive(), Primitive::Float);
        assert_eq!(t.count(), 3);
        assert_eq!(t.size(), 12);
        assert!(t.is_array());
    }

    #[test]
    fn parses_char_array_as_string() {
        let t = MavType::parse("char[16]").unwrap();
        assert!(t.is_string());
        assert!(!t.is_array());
        assert_eq!(t.size(), 16);
    }

    #[test]
    fn strips_mavlink_version_suffix() {
        let t = MavType::parse("uint8_t_mavlink_version").unwrap();
        assert_eq!(t.primitive(), Primitive::UInt8);
        assert!(t.is_mavlink_version());
        assert_eq!(t.crc_type_name(), "uint8_t");
    }

    #[test]
    fn rejects_garbage() {
        assert!(MavType::parse("not_a_type").is_err());
        assert!(MavType::parse("uint8_t[abc]").is_err());
    }
}
