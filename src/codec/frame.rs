//! Encodes and decodes MAVLink v1/v2 frames: header, field (re)ordering, v2 truncation, and the
//! trailing CRC.

use std::sync::Arc;

use super::crc;
use super::header::{Header, Version, INCOMPAT_FLAG_SIGNED, SIGNATURE_LEN};
use crate::error::{DecodeError, EncodeError, FrameError};
use crate::protocol::{Content, MavType, Message, MessageField, Primitive, Schema, Value};

/// A fully decoded, schema-resolved incoming message.
#[derive(Debug, Clone)]
pub struct Packet {
    /// The message definition this packet was decoded against.
    pub message: Arc<Message>,
    /// Decoded field values, in declaration order.
    pub content: Content,
}

/// Encodes `content` as a v1 frame (marker through trailing CRC), using only `message`'s base
/// fields. Fails if `message.id()` does not fit in v1's single id byte.
pub fn encode_v1(
    schema: &Schema,
    message: &Message,
    seq: u8,
    sysid: u8,
    compid: u8,
    content: &Content,
) -> Result<Vec<u8>, EncodeError> {
    if !message.is_v1_compatible() {
        return Err(EncodeError::NotV1Compatible(message.id()));
    }
    let payload = encode_fields(schema, message, message.fields_reordered(), content)?;
    let header = Header {
        version: Version::V1,
        payload_size: payload.len() as u8,
        incompat_flags: 0,
        compat_flags: 0,
        seq,
        sysid,
        compid,
        msgid: message.id(),
    };
    Ok(assemble(&header, message.crc_extra(), &payload))
}

/// Encodes `content` as a v2 frame, covering base fields and extensions, with trailing
/// all-zero bytes trimmed (never below 1 byte).
pub fn encode_v2(
    schema: &Schema,
    message: &Message,
    seq: u8,
    sysid: u8,
    compid: u8,
    content: &Content,
) -> Result<Vec<u8>, EncodeError> {
    let mut payload = encode_fields(schema, message, message.all_fields_reordered(), content)?;
    truncate_trailing_zeros(&mut payload);
    let header = Header {
        version: Version::V2,
        payload_size: payload.len() as u8,
        incompat_flags: 0,
        compat_flags: 0,
        seq,
        sysid,
        compid,
        msgid: message.id(),
    };
    Ok(assemble(&header, message.crc_extra(), &payload))
}

fn assemble(header: &Header, crc_extra: u8, payload: &[u8]) -> Vec<u8> {
    let header_bytes = header.encode();
    let crc_value = crc::digest([header_bytes.as_slice(), payload, &[crc_extra][..]]);

    let mut frame = Vec::with_capacity(1 + header_bytes.len() + payload.len() + 2);
    frame.push(header.version.marker());
    frame.extend_from_slice(&header_bytes);
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&crc_value.to_le_bytes());
    frame
}

/// Trims trailing zero bytes from a v2 payload, always leaving at least one byte.
fn truncate_trailing_zeros(payload: &mut Vec<u8>) {
    while payload.len() > 1 && *payload.last().unwrap() == 0 {
        payload.pop();
    }
}

fn encode_fields<'a>(
    schema: &Schema,
    message: &Message,
    fields: impl Iterator<Item = &'a MessageField>,
    content: &Content,
) -> Result<Vec<u8>, EncodeError> {
    for (name, _) in content.iter() {
        if message.field_by_name(name).is_none() {
            return Err(EncodeError::UnknownField(name.to_string()));
        }
    }

    let mut buf = Vec::new();
    for field in fields {
        let value = content
            .get(field.name())
            .ok_or_else(|| EncodeError::MissingField(field.name().to_string()))?;
        write_field(&mut buf, schema, field, value)?;
    }
    Ok(buf)
}

/// Builds a [`Content`] from positional values given in `message.all_fields()` order (not
/// reordered for the wire) — the alternative to a name→value mapping for callers that would
/// rather supply values by position. Fails with [`EncodeError::WrongArity`] if `values` doesn't
/// have exactly one entry per field.
pub fn content_from_positional(message: &Message, values: &[Value]) -> Result<Content, EncodeError> {
    let fields: Vec<&MessageField> = message.all_fields().collect();
    if values.len() != fields.len() {
        return Err(EncodeError::WrongArity { expected: fields.len(), got: values.len() });
    }
    let mut content = Content::new();
    for (field, value) in fields.iter().zip(values.iter()) {
        content.insert(field.name(), value.clone());
    }
    Ok(content)
}

fn write_field(buf: &mut Vec<u8>, schema: &Schema, field: &MessageField, value: &Value) -> Result<(), EncodeError> {
    let ty = field.r#type();

    if ty.is_string() {
        let text = value.as_str().ok_or_else(|| type_mismatch(field))?;
        let mut bytes = text.as_bytes().to_vec();
        bytes.resize(ty.count(), 0);
        buf.extend_from_slice(&bytes);
        return Ok(());
    }

    if let Some(enum_name) = field.r#enum() {
        let e = schema.r#enum(enum_name);
        if field.bitmask() {
            let names = match value {
                Value::EnumSet(names) => names.clone(),
                _ => return Err(type_mismatch(field)),
            };
            let mut bits: u64 = 0;
            if let Some(e) = e {
                for n in &names {
                    let entry = e
                        .entry_by_name(n)
                        .ok_or_else(|| EncodeError::UnknownEnumEntry {
                            enum_name: enum_name.to_string(),
                            entry: n.clone(),
                        })?;
                    bits |= entry.value();
                }
            }
            write_scalar(buf, ty.primitive(), bits as i64, bits, bits as f64);
            return Ok(());
        }

        let numeric = match value {
            Value::EnumName(name) => {
                let e = e.ok_or_else(|| EncodeError::UnknownEnumEntry {
                    enum_name: enum_name.to_string(),
                    entry: name.clone(),
                })?;
                e.entry_by_name(name)
                    .ok_or_else(|| EncodeError::UnknownEnumEntry {
                        enum_name: enum_name.to_string(),
                        entry: name.clone(),
                    })?
                    .value()
            }
            Value::UInt(v) => *v,
            Value::Int(v) => *v as u64,
            _ => return Err(type_mismatch(field)),
        };
        write_scalar(buf, ty.primitive(), numeric as i64, numeric, numeric as f64);
        return Ok(());
    }

    if ty.is_array() {
        write_array(buf, ty, value, field)?;
        return Ok(());
    }

    match (ty.primitive(), value) {
        (Primitive::Float | Primitive::Double, Value::Float(v)) => write_scalar(buf, ty.primitive(), *v as i64, *v as u64, *v),
        (Primitive::Float | Primitive::Double, Value::Int(v)) => write_scalar(buf, ty.primitive(), *v, *v as u64, *v as f64),
        (Primitive::Float | Primitive::Double, Value::UInt(v)) => write_scalar(buf, ty.primitive(), *v as i64, *v, *v as f64),
        (_, Value::Int(v)) => write_scalar(buf, ty.primitive(), *v, *v as u64, *v as f64),
        (_, Value::UInt(v)) => write_scalar(buf, ty.primitive(), *v as i64, *v, *v as f64),
        _ => return Err(type_mismatch(field)),
    }
    Ok(())
}

fn write_array(buf: &mut Vec<u8>, ty: &MavType, value: &Value, field: &MessageField) -> Result<(), EncodeError> {
    match (ty.primitive(), value) {
        (Primitive::Float | Primitive::Double, Value::FloatVec(vs)) => {
            for i in 0..ty.count() {
                let v = vs.get(i).copied().unwrap_or(0.0);
                write_scalar(buf, ty.primitive(), v as i64, v as u64, v);
            }
        }
        (_, Value::IntVec(vs)) if ty.primitive().is_signed() => {
            for i in 0..ty.count() {
                let v = vs.get(i).copied().unwrap_or(0);
                write_scalar(buf, ty.primitive(), v, v as u64, v as f64);
            }
        }
        (_, Value::UIntVec(vs)) => {
            for i in 0..ty.count() {
                let v = vs.get(i).copied().unwrap_or(0);
                write_scalar(buf, ty.primitive(), v as i64, v, v as f64);
            }
        }
        (_, Value::IntVec(vs)) => {
            for i in 0..ty.count() {
                let v = vs.get(i).copied().unwrap_or(0);
                write_scalar(buf, ty.primitive(), v, v as u64, v as f64);
            }
        }
        _ => return Err(type_mismatch(field)),
    }
    Ok(())
}

fn write_scalar(buf: &mut Vec<u8>, primitive: Primitive, signed: i64, unsigned: u64, float: f64) {
    match primitive {
        Primitive::Int8 => buf.push(signed as i8 as u8),
        Primitive::UInt8 | Primitive::Char => buf.push(unsigned as u8),
        Primitive::Int16 => buf.extend_from_slice(&(signed as i16).to_le_bytes()),
        Primitive::UInt16 => buf.extend_from_slice(&(unsigned as u16).to_le_bytes()),
        Primitive::Int32 => buf.extend_from_slice(&(signed as i32).to_le_bytes()),
        Primitive::UInt32 => buf.extend_from_slice(&(unsigned as u32).to_le_bytes()),
        Primitive::Int64 => buf.extend_from_slice(&signed.to_le_bytes()),
        Primitive::UInt64 => buf.extend_from_slice(&unsigned.to_le_bytes()),
        Primitive::Float => buf.extend_from_slice(&(float as f32).to_le_bytes()),
        Primitive::Double => buf.extend_from_slice(&float.to_le_bytes()),
    }
}

fn type_mismatch(field: &MessageField) -> EncodeError {
    EncodeError::TypeMismatch {
        field: field.name().to_string(),
        expected: field.r#type().crc_type_name().to_string(),
    }
}

/// Decodes a raw payload into a [`Content`], resolving enum-bound fields via `schema`.
///
/// Per the wire format, `payload` is sliced in `all_fields_reordered` order but the returned
/// content is built in `all_fields` (declaration) order. Short payloads (MAVLink v2 truncation)
/// are implicitly zero-padded.
pub fn decode_content(schema: &Schema, message: &Message, payload: &[u8]) -> Result<Content, DecodeError> {
    let total_size = message.expected_payload_size_v2();
    let mut padded = payload.to_vec();
    if padded.len() < total_size {
        padded.resize(total_size, 0);
    }

    let mut offset = 0usize;
    let mut by_name = std::collections::HashMap::new();
    for field in message.all_fields_reordered() {
        let size = field.r#type().size();
        let slice = &padded[offset..offset + size];
        offset += size;
        let value = decode_field(schema, field, slice)?;
        by_name.insert(field.name().to_string(), value);
    }

    let mut content = Content::new();
    for field in message.all_fields() {
        if let Some(v) = by_name.remove(field.name()) {
            content.insert(field.name(), v);
        }
    }
    Ok(content)
}

fn decode_field(schema: &Schema, field: &MessageField, bytes: &[u8]) -> Result<Value, DecodeError> {
    let ty = field.r#type();

    if ty.is_string() {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        return Ok(Value::Text(String::from_utf8_lossy(&bytes[..end]).into_owned()));
    }

    if ty.is_array() {
        return Ok(decode_array(ty, bytes));
    }

    let raw = read_scalar(ty.primitive(), bytes);

    if let Some(enum_name) = field.r#enum() {
        let enum_def = schema.r#enum(enum_name);
        if field.bitmask() {
            let bits = raw.as_u64().unwrap_or(0);
            let names = enum_def.map(|e| e.decode_bitmask(bits)).unwrap_or_default();
            return Ok(Value::EnumSet(names));
        }
        let value = raw.as_u64().unwrap_or(0);
        let entry = enum_def.and_then(|e| e.entry_by_value(value));
        return match entry {
            Some(e) => Ok(Value::EnumName(e.name().to_string())),
            None => Err(DecodeError::UnknownEnumValue {
                field: field.name().to_string(),
                enum_name: enum_name.to_string(),
                value,
            }),
        };
    }

    Ok(raw)
}

fn decode_array(ty: &MavType, bytes: &[u8]) -> Value {
    let elem = ty.primitive().size();
    let values: Vec<Value> = bytes.chunks(elem).map(|chunk| read_scalar(ty.primitive(), chunk)).collect();
    if matches!(ty.primitive(), Primitive::Float | Primitive::Double) {
        Value::FloatVec(values.iter().filter_map(Value::as_f64).collect())
    } else if ty.primitive().is_signed() {
        Value::IntVec(values.iter().filter_map(Value::as_i64).collect())
    } else {
        Value::UIntVec(values.iter().filter_map(Value::as_u64).collect())
    }
}

fn read_scalar(primitive: Primitive, bytes: &[u8]) -> Value {
    match primitive {
        Primitive::Int8 => Value::Int(bytes[0] as i8 as i64),
        Primitive::UInt8 | Primitive::Char => Value::UInt(bytes[0] as u64),
        Primitive::Int16 => Value::Int(i16::from_le_bytes([bytes[0], bytes[1]]) as i64),
        Primitive::UInt16 => Value::UInt(u16::from_le_bytes([bytes[0], bytes[1]]) as u64),
        Primitive::Int32 => Value::Int(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64),
        Primitive::UInt32 => Value::UInt(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64),
        Primitive::Int64 => Value::Int(i64::from_le_bytes(bytes[0..8].try_into().unwrap())),
        Primitive::UInt64 => Value::UInt(u64::from_le_bytes(bytes[0..8].try_into().unwrap())),
        Primitive::Float => Value::Float(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64),
        Primitive::Double => Value::Float(f64::from_le_bytes(bytes[0..8].try_into().unwrap())),
    }
}

/// Validates a received frame's CRC against the message's `crc_extra`.
pub fn verify_crc(header_bytes: &[u8], payload: &[u8], crc_extra: u8, trailer: u16, msgid: u32) -> Result<(), FrameError> {
    let expected = crc::digest([header_bytes, payload, &[crc_extra][..]]);
    if expected != trailer {
        return Err(FrameError::CrcMismatch {
            msgid,
            expected,
            actual: trailer,
        });
    }
    Ok(())
}

/// Length, in bytes, of the signature block trailing a signed v2 frame (parsed-and-skipped only).
pub fn signature_len(header: &Header) -> usize {
    if header.has_signature() {
        SIGNATURE_LEN
    } else {
        0
    }
}

/// Whether `incompat_flags` declares a signature block.
pub fn is_signed(incompat_flags: u8) -> bool {
    incompat_flags & INCOMPAT_FLAG_SIGNED != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Enum, EnumEntry, MavType as T};

    fn heartbeat_schema() -> (Schema, Arc<Message>) {
        let mut schema = Schema::new();
        schema.add_enum(Enum::new(
            "MAV_TYPE".to_string(),
            String::new(),
            vec![EnumEntry::new("MAV_TYPE_QUADROTOR".to_string(), 2, String::new(), vec![])],
        ));
        schema.add_enum(Enum::new(
            "MAV_AUTOPILOT".to_string(),
            String::new(),
            vec![EnumEntry::new(
                "MAV_AUTOPILOT_ARDUPILOTMEGA".to_string(),
                3,
                String::new(),
                vec![],
            )],
        ));
        schema.add_enum(Enum::new(
            "MAV_STATE".to_string(),
            String::new(),
            vec![EnumEntry::new("MAV_STATE_STANDBY".to_string(), 3, String::new(), vec![])],
        ));

        let fields = vec![
            MessageField::new(
                "custom_mode".to_string(),
                String::new(),
                T::parse("uint32_t").unwrap(),
                None,
                false,
                None,
                None,
                false,
            ),
            MessageField::new(
                "type".to_string(),
                String::new(),
                T::parse("uint8_t").unwrap(),
                Some("MAV_TYPE".to_string()),
                false,
                None,
                None,
                false,
            ),
            MessageField::new(
                "autopilot".to_string(),
                String::new(),
                T::parse("uint8_t").unwrap(),
                Some("MAV_AUTOPILOT".to_string()),
                false,
                None,
                None,
                false,
            ),
            MessageField::new(
                "base_mode".to_string(),
                String::new(),
                T::parse("uint8_t").unwrap(),
                None,
                false,
                None,
                None,
                false,
            ),
            MessageField::new(
                "system_status".to_string(),
                String::new(),
                T::parse("uint8_t").unwrap(),
                Some("MAV_STATE".to_string()),
                false,
                None,
                None,
                false,
            ),
            MessageField::new(
                "mavlink_version".to_string(),
                String::new(),
                T::parse("uint8_t_mavlink_version").unwrap(),
                None,
                false,
                None,
                None,
                false,
            ),
        ];
        let message = Message::new(0, "HEARTBEAT".to_string(), String::new(), fields, vec![]);
        schema.add_message(message).unwrap();
        let message = schema.message_by_name("HEARTBEAT").unwrap().clone();
        (schema, message)
    }

    fn heartbeat_content() -> Content {
        let mut content = Content::new();
        content.insert("custom_mode", Value::UInt(0));
        content.insert("type", Value::EnumName("MAV_TYPE_QUADROTOR".to_string()));
        content.insert("autopilot", Value::EnumName("MAV_AUTOPILOT_ARDUPILOTMEGA".to_string()));
        content.insert("base_mode", Value::UInt(0x81));
        content.insert("system_status", Value::EnumName("MAV_STATE_STANDBY".to_string()));
        content.insert("mavlink_version", Value::UInt(3));
        content
    }

    #[test]
    fn v1_round_trip_matches_scenario() {
        let (schema, message) = heartbeat_schema();
        let content = heartbeat_content();
        let frame = encode_v1(&schema, &message, 7, 1, 1, &content).unwrap();

        assert_eq!(&frame[0..6], &[0xFE, 0x09, 0x07, 0x01, 0x01, 0x00]);
        assert_eq!(frame.len(), 6 + 9 + 2);

        let payload = &frame[6..6 + 9];
        let decoded = decode_content(&schema, &message, payload).unwrap();
        assert_eq!(decoded, content);
    }

    #[test]
    fn v2_trims_trailing_zeros_down_to_one_byte_floor() {
        let mut schema = Schema::new();
        let fields = vec![
            MessageField::new(
                "a".to_string(),
                String::new(),
                T::parse("uint32_t").unwrap(),
                None,
                false,
                None,
                None,
                false,
            ),
            MessageField::new(
                "b".to_string(),
                String::new(),
                T::parse("uint8_t").unwrap(),
                None,
                false,
                None,
                None,
                false,
            ),
        ];
        schema
            .add_message(Message::new(322, "ALL_BUT_FIRST_BYTE_ZERO".to_string(), String::new(), fields, vec![]))
            .unwrap();
        let message = schema.message_by_name("ALL_BUT_FIRST_BYTE_ZERO").unwrap().clone();

        let mut content = Content::new();
        content.insert("a", Value::UInt(5));
        content.insert("b", Value::UInt(0));

        let frame = encode_v2(&schema, &message, 0, 1, 1, &content).unwrap();
        let payload_len = frame.len() - 9 /* header */ - 1 /* marker */ - 2 /* crc */;
        assert_eq!(payload_len, 1);

        let payload = &frame[10..10 + payload_len];
        let decoded = decode_content(&schema, &message, payload).unwrap();
        assert_eq!(decoded.get("a"), Some(&Value::UInt(5)));
        assert_eq!(decoded.get("b"), Some(&Value::UInt(0)));
    }

    #[test]
    fn v2_keeps_full_payload_when_trailing_field_is_nonzero() {
        let mut schema = Schema::new();
        let fields = vec![
            MessageField::new(
                "a".to_string(),
                String::new(),
                T::parse("uint8_t").unwrap(),
                None,
                false,
                None,
                None,
                false,
            ),
            MessageField::new(
                "b".to_string(),
                String::new(),
                T::parse("uint8_t").unwrap(),
                None,
                false,
                None,
                None,
                false,
            ),
        ];
        schema
            .add_message(Message::new(323, "TWO_BYTES".to_string(), String::new(), fields, vec![]))
            .unwrap();
        let message = schema.message_by_name("TWO_BYTES").unwrap().clone();

        let mut content = Content::new();
        content.insert("a", Value::UInt(0));
        content.insert("b", Value::UInt(9));

        let frame = encode_v2(&schema, &message, 0, 1, 1, &content).unwrap();
        let payload_len = frame.len() - 9 /* header */ - 1 /* marker */ - 2 /* crc */;
        assert_eq!(payload_len, 2);
    }

    #[test]
    fn rejects_v1_encoding_of_v2_only_message() {
        let mut schema = Schema::new();
        schema
            .add_message(Message::new(300, "X".to_string(), String::new(), vec![], vec![]))
            .unwrap();
        let message = schema.message_by_name("X").unwrap().clone();
        let err = encode_v1(&schema, &message, 0, 1, 1, &Content::new());
        assert!(matches!(err, Err(EncodeError::NotV1Compatible(300))));
    }

    #[test]
    fn rejects_unknown_field_in_content() {
        let (schema, message) = heartbeat_schema();
        let mut content = heartbeat_content();
        content.insert("custom_mode_typo", Value::UInt(0));

        let err = encode_v1(&schema, &message, 0, 1, 1, &content);
        assert!(matches!(err, Err(EncodeError::UnknownField(name)) if name == "custom_mode_typo"));

        let err = encode_v2(&schema, &message, 0, 1, 1, &content);
        assert!(matches!(err, Err(EncodeError::UnknownField(name)) if name == "custom_mode_typo"));
    }

    #[test]
    fn positional_content_round_trips_with_the_mapping_form() {
        let (schema, message) = heartbeat_schema();
        let values = vec![
            Value::UInt(0),
            Value::EnumName("MAV_TYPE_QUADROTOR".to_string()),
            Value::EnumName("MAV_AUTOPILOT_ARDUPILOTMEGA".to_string()),
            Value::UInt(0x81),
            Value::EnumName("MAV_STATE_STANDBY".to_string()),
            Value::UInt(3),
        ];
        let content = content_from_positional(&message, &values).unwrap();
        assert_eq!(content, heartbeat_content());
    }

    #[test]
    fn positional_content_rejects_wrong_arity() {
        let (_, message) = heartbeat_schema();
        let err = content_from_positional(&message, &[Value::UInt(0)]);
        assert!(matches!(err, Err(EncodeError::WrongArity { expected: 6, got: 1 })));
    }
}
